//! Canonical date and time forms shared by both feeds and the exclusion rules.
//!
//! Dates come in as `M-D-YY`, `M-D-YYYY`, `MM/DD/YYYY` and friends; times as `H:MM`,
//! `H:MM:SS` or `H:MM AM`. Nothing in here fails loudly, unusable input is `None` and the
//! caller decides whether to drop the record.

use chrono::NaiveDate;

/// Parses a month/day/year string split by `/` or `-` into a calendar date.
///
/// Two digit years are read as `20YY`.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split(['/', '-']).map(str::trim).collect();
    let [month, day, year] = parts.as_slice() else {
        return None;
    };
    let year = match year.len() {
        2 => format!("20{year}"),
        4 => year.to_string(),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(
        year.parse().ok()?,
        month.parse().ok()?,
        day.parse().ok()?,
    )
}

/// Canonical `YYYY-MM-DD` text for a raw feed date, empty when unparseable.
pub fn normalize_date_str(raw: &str) -> String {
    normalize_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Converts a clock time into zero padded 24 hour `HH:MM`.
///
/// Seconds are dropped. `None` for empty input or anything that is not a clock time.
pub fn normalize_time(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let upper = raw.to_ascii_uppercase();
    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim(), Some(Meridiem::Am))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim(), Some(Meridiem::Pm))
    } else {
        (upper.as_str(), None)
    };

    let mut fields = clock.split(':');
    let hour: u32 = fields.next()?.trim().parse().ok()?;
    let minute = fields.next()?.trim();
    let minute: u32 = minute.get(..2).unwrap_or(minute).parse().ok()?;

    let hour = match meridiem {
        Some(Meridiem::Pm) if hour < 12 => hour + 12,
        Some(Meridiem::Am) if hour == 12 => 0,
        _ => hour,
    };
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{hour:02}:{minute:02}"))
}

enum Meridiem {
    Am,
    Pm,
}

/// `M-D-YYYY` without zero padding, the form the tee sheet vendor expects.
pub fn vendor_date(date: NaiveDate) -> String {
    date.format("%-m-%-d-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_from_both_separators() {
        assert_eq!(normalize_date_str("3-7-24"), "2024-03-07");
        assert_eq!(normalize_date_str("03/07/2024"), "2024-03-07");
        assert_eq!(normalize_date_str(" 12-31-2023 "), "2023-12-31");
    }

    #[test]
    fn malformed_dates_are_empty() {
        assert_eq!(normalize_date_str("2024-03"), "");
        assert_eq!(normalize_date_str("Date"), "");
        assert_eq!(normalize_date_str(""), "");
        assert_eq!(normalize_date_str("13/01/2024"), "");
        assert_eq!(normalize_date_str("1/2/3/2024"), "");
    }

    #[test]
    fn twelve_hour_times() {
        assert_eq!(normalize_time(Some("7:05 AM")).as_deref(), Some("07:05"));
        assert_eq!(normalize_time(Some("1:05 PM")).as_deref(), Some("13:05"));
        assert_eq!(normalize_time(Some("12:10 am")).as_deref(), Some("00:10"));
        assert_eq!(normalize_time(Some("12:30 PM")).as_deref(), Some("12:30"));
        assert_eq!(normalize_time(Some("8:00PM")).as_deref(), Some("20:00"));
    }

    #[test]
    fn twenty_four_hour_times_and_seconds() {
        assert_eq!(normalize_time(Some("8:00")).as_deref(), Some("08:00"));
        assert_eq!(normalize_time(Some("14:45:30")).as_deref(), Some("14:45"));
        assert_eq!(normalize_time(Some("07:05:00 AM")).as_deref(), Some("07:05"));
    }

    #[test]
    fn missing_or_garbage_times() {
        assert_eq!(normalize_time(None), None);
        assert_eq!(normalize_time(Some("")), None);
        assert_eq!(normalize_time(Some("   ")), None);
        assert_eq!(normalize_time(Some("noon")), None);
        assert_eq!(normalize_time(Some("25:00")), None);
    }

    #[test]
    fn vendor_date_has_no_padding() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(vendor_date(date), "6-1-2024");
    }
}
