use chrono::{Duration, Local, NaiveDate};
use service::error::GenericError;

/// Reads an optional `YYYY-MM-DD` query value.
pub(crate) fn parse_date(
    raw: Option<&str>,
    invalid: &'static str,
) -> Result<Option<NaiveDate>, GenericError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| GenericError::BadRequest(invalid)),
    }
}

/// The report for a day arrives the day after, so scheduled runs look at yesterday.
pub(crate) fn yesterday() -> NaiveDate {
    Local::now().date_naive() - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_iso() {
        assert_eq!(
            parse_date(Some("2024-06-01"), "bad").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(parse_date(Some(" "), "bad").unwrap(), None);
        assert!(parse_date(Some("6/1/2024"), "bad").is_err());
    }
}
