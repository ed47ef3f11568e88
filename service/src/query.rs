use std::collections::HashMap;

use chrono::NaiveDate;
use entity::prelude::*;
use entity::sea_orm_active_enums::PostingStatus;
use entity::*;
use itertools::Itertools;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{Condition, QueryOrder};

use crate::dto::{DuplicateGolfers, DuplicateGroup, MissingField};
use crate::error::GenericError;

/// Key used to match member numbers across the tee sheet and the golfer table.
pub fn member_key(member_number: &str) -> String {
    member_number.trim().to_lowercase()
}

/// Resolves member numbers in one query, keyed by [`member_key`].
pub async fn golfers_by_member_numbers(
    db: &impl ConnectionTrait,
    member_numbers: &[String],
) -> Result<HashMap<String, golfer::Model>, DbErr> {
    let keys: Vec<String> = member_numbers
        .iter()
        .map(|m| member_key(m))
        .filter(|m| !m.is_empty())
        .unique()
        .collect();
    if keys.is_empty() {
        return Ok(HashMap::new());
    }
    let golfers = Golfer::find()
        .filter(Expr::expr(Func::lower(Expr::col(golfer::Column::MemberNumber))).is_in(keys))
        .order_by_asc(golfer::Column::Id)
        .all(db)
        .await?;

    let mut found = HashMap::new();
    for golfer in golfers {
        if let Some(key) = golfer.member_number.as_deref().map(member_key) {
            // Duplicated member numbers resolve to the oldest golfer
            found.entry(key).or_insert(golfer);
        }
    }
    Ok(found)
}

/// Status of every round already stored for `date`, keyed by golfer and tee time.
pub async fn round_statuses_for_date(
    db: &impl ConnectionTrait,
    date: NaiveDate,
) -> Result<HashMap<(i32, String), PostingStatus>, DbErr> {
    Ok(TeeTime::find()
        .filter(tee_time::Column::Date.eq(date))
        .all(db)
        .await?
        .into_iter()
        .map(|r| ((r.golfer_id, r.tee_time), r.posting_status))
        .collect())
}

pub async fn rounds_for_date(
    db: &impl ConnectionTrait,
    date: NaiveDate,
) -> Result<Vec<(tee_time::Model, Option<golfer::Model>)>, DbErr> {
    TeeTime::find()
        .filter(tee_time::Column::Date.eq(date))
        .find_also_related(Golfer)
        .order_by_asc(tee_time::Column::TeeTime)
        .all(db)
        .await
}

pub async fn exclusions_for_date(
    db: &impl ConnectionTrait,
    date: NaiveDate,
) -> Result<Vec<excluded_date::Model>, DbErr> {
    ExcludedDate::find()
        .filter(excluded_date::Column::Date.eq(date))
        .order_by_asc(excluded_date::Column::StartTime)
        .all(db)
        .await
}

pub async fn all_exclusions(db: &impl ConnectionTrait) -> Result<Vec<excluded_date::Model>, DbErr> {
    ExcludedDate::find()
        .order_by_asc(excluded_date::Column::Date)
        .order_by_asc(excluded_date::Column::StartTime)
        .all(db)
        .await
}

pub async fn get_golfer(db: &impl ConnectionTrait, id: i32) -> Result<golfer::Model, GenericError> {
    Golfer::find_by_id(id)
        .one(db)
        .await?
        .ok_or(GenericError::NotFound("Golfer not found"))
}

/// Golfers ordered by name, optionally filtered by a name or member number fragment.
pub async fn search_golfers(
    db: &impl ConnectionTrait,
    search: Option<&str>,
) -> Result<Vec<golfer::Model>, DbErr> {
    let mut query = Golfer::find()
        .order_by_asc(golfer::Column::LastName)
        .order_by_asc(golfer::Column::FirstName);
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", term.to_lowercase());
        let lowered = |col: golfer::Column| Expr::expr(Func::lower(Expr::col(col)));
        query = query.filter(
            Condition::any()
                .add(lowered(golfer::Column::FirstName).like(pattern.as_str()))
                .add(lowered(golfer::Column::LastName).like(pattern.as_str()))
                .add(lowered(golfer::Column::MemberNumber).like(pattern.as_str())),
        );
    }
    query.all(db).await
}

fn duplicate_groups(
    golfers: &[golfer::Model],
    key: impl Fn(&golfer::Model) -> Option<&String>,
) -> Vec<DuplicateGroup> {
    golfers
        .iter()
        .filter_map(|g| {
            key(g)
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .map(|k| (k, g))
        })
        .into_group_map()
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(key, group)| DuplicateGroup {
            key,
            golfers: group.into_iter().cloned().map(Into::into).collect(),
        })
        .sorted_by(|a, b| a.key.cmp(&b.key))
        .collect()
}

/// Golfers sharing a GHIN or a member number.
pub async fn duplicate_golfers(db: &impl ConnectionTrait) -> Result<DuplicateGolfers, DbErr> {
    let golfers = Golfer::find().order_by_asc(golfer::Column::Id).all(db).await?;
    Ok(DuplicateGolfers {
        by_ghin: duplicate_groups(&golfers, |g| g.ghin_number.as_ref()),
        by_member_number: duplicate_groups(&golfers, |g| g.member_number.as_ref()),
    })
}

/// Golfers with a blank or absent value for `field`.
pub async fn golfers_missing(
    db: &impl ConnectionTrait,
    field: MissingField,
) -> Result<Vec<golfer::Model>, DbErr> {
    let value = |g: &golfer::Model| -> Option<String> {
        match field {
            MissingField::Email => g.email.clone(),
            MissingField::Ghin => g.ghin_number.clone(),
            MissingField::MemberNumber => g.member_number.clone(),
        }
    };
    Ok(Golfer::find()
        .order_by_asc(golfer::Column::LastName)
        .order_by_asc(golfer::Column::FirstName)
        .all(db)
        .await?
        .into_iter()
        .filter(|g| value(g).map_or(true, |v| v.trim().is_empty()))
        .collect())
}

/// Rounds for one golfer, newest first, optionally bounded by inclusive dates.
pub async fn rounds_for_golfer(
    db: &impl ConnectionTrait,
    golfer_id: i32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<tee_time::Model>, DbErr> {
    let mut query = TeeTime::find().filter(tee_time::Column::GolferId.eq(golfer_id));
    if let Some(start) = start {
        query = query.filter(tee_time::Column::Date.gte(start));
    }
    if let Some(end) = end {
        query = query.filter(tee_time::Column::Date.lte(end));
    }
    query
        .order_by_desc(tee_time::Column::Date)
        .order_by_desc(tee_time::Column::TeeTime)
        .all(db)
        .await
}

/// Every round in an inclusive date range with its golfer.
pub async fn rounds_with_golfers(
    db: &impl ConnectionTrait,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<(tee_time::Model, golfer::Model)>, DbErr> {
    let mut query = TeeTime::find();
    if let Some(start) = start {
        query = query.filter(tee_time::Column::Date.gte(start));
    }
    if let Some(end) = end {
        query = query.filter(tee_time::Column::Date.lte(end));
    }
    Ok(query
        .find_also_related(Golfer)
        .order_by_desc(tee_time::Column::Date)
        .order_by_desc(tee_time::Column::TeeTime)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(round, golfer)| golfer.map(|g| (round, g)))
        .collect())
}
