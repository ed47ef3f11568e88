use entity::{excluded_date, golfer};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ConnectionTrait};

use super::*;
use crate::error::GenericError;
use crate::normalize::normalize_time;

fn tidy(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn canonical_time(
    value: Option<String>,
    invalid: &'static str,
) -> Result<Option<String>, GenericError> {
    match tidy(value) {
        None => Ok(None),
        Some(raw) => normalize_time(Some(&raw))
            .map(Some)
            .ok_or(GenericError::BadRequest(invalid)),
    }
}

impl NewExclusion {
    /// Checks the bounds and stores them as canonical `HH:MM`.
    pub fn into_active_model(self) -> Result<excluded_date::ActiveModel, GenericError> {
        let start = canonical_time(self.start_time, "Invalid start time")?;
        let end = canonical_time(self.end_time, "Invalid end time")?;
        if let (Some(start), Some(end)) = (&start, &end) {
            if start > end {
                return Err(GenericError::BadRequest("Start time is after end time"));
            }
        }
        Ok(excluded_date::ActiveModel {
            id: NotSet,
            date: Set(self.date),
            start_time: Set(start),
            end_time: Set(end),
            reason: Set(tidy(self.reason)),
        })
    }

    pub async fn insert(
        self,
        db: &impl ConnectionTrait,
    ) -> Result<excluded_date::Model, GenericError> {
        Ok(self.into_active_model()?.insert(db).await?)
    }
}

impl GolferForm {
    fn into_active_model(self, id: Option<i32>) -> Result<golfer::ActiveModel, GenericError> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(GenericError::BadRequest("First and last name are required"));
        }
        Ok(golfer::ActiveModel {
            id: id.map_or(NotSet, Set),
            first_name: Set(first_name),
            middle_name: Set(tidy(self.middle_name)),
            last_name: Set(last_name),
            suffix: Set(tidy(self.suffix)),
            email: Set(tidy(self.email)),
            gender: Set(tidy(self.gender)),
            member_number: Set(tidy(self.member_number)),
            ghin_number: Set(tidy(self.ghin_number)),
        })
    }

    pub async fn insert(self, db: &impl ConnectionTrait) -> Result<golfer::Model, GenericError> {
        Ok(self.into_active_model(None)?.insert(db).await?)
    }

    pub async fn update(
        self,
        db: &impl ConnectionTrait,
        id: i32,
    ) -> Result<golfer::Model, GenericError> {
        crate::get_golfer(db, id).await?;
        Ok(self.into_active_model(Some(id))?.update(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn exclusion(start: Option<&str>, end: Option<&str>) -> NewExclusion {
        NewExclusion {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: start.map(str::to_string),
            end_time: end.map(str::to_string),
            reason: Some("  Member-guest ".to_string()),
        }
    }

    #[test]
    fn exclusion_times_are_stored_canonical() {
        let model = exclusion(Some("1:00 PM"), Some(" ")).into_active_model().unwrap();
        assert_eq!(model.start_time, Set(Some("13:00".to_string())));
        assert_eq!(model.end_time, Set(None));
        assert_eq!(model.reason, Set(Some("Member-guest".to_string())));
    }

    #[test]
    fn bad_exclusion_times_are_rejected() {
        assert!(matches!(
            exclusion(Some("noon"), None).into_active_model(),
            Err(GenericError::BadRequest("Invalid start time"))
        ));
        assert!(matches!(
            exclusion(Some("14:00"), Some("9:00")).into_active_model(),
            Err(GenericError::BadRequest(_))
        ));
    }

    #[test]
    fn golfer_names_are_required() {
        let form = GolferForm {
            first_name: " ".to_string(),
            last_name: "Smith".to_string(),
            ..Default::default()
        };
        assert!(form.into_active_model(None).is_err());
    }
}
