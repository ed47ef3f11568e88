use lazy_static::lazy_static;
use regex::Regex;

use crate::normalize::normalize_time;

lazy_static! {
    static ref CLOCK_TIME: Regex =
        Regex::new(r"\d{1,2}:\d{2}(?::\d{2})?(?:\s*[APMapm]{2})?").expect("valid clock regex");
}

/// A blackout window for one calendar date.
///
/// No bounds excludes the whole day, a single bound is open ended towards the
/// start or end of the day. Both bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionWindow {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl ExclusionWindow {
    pub fn full_day() -> Self {
        Self::default()
    }

    pub fn between(start: &str, end: &str) -> Self {
        Self {
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
        }
    }

    pub fn from_start(start: &str) -> Self {
        Self {
            start_time: Some(start.to_string()),
            end_time: None,
        }
    }

    pub fn until(end: &str) -> Self {
        Self {
            start_time: None,
            end_time: Some(end.to_string()),
        }
    }

    fn covers(&self, time: Option<&str>) -> bool {
        let start = normalize_time(self.start_time.as_deref());
        let end = normalize_time(self.end_time.as_deref());
        match (start, end, time) {
            (None, None, _) => true,
            (_, _, None) => false,
            // Zero padded HH:MM compares the same lexically as numerically
            (Some(start), Some(end), Some(t)) => start.as_str() <= t && t <= end.as_str(),
            (Some(start), None, Some(t)) => t >= start.as_str(),
            (None, Some(end), Some(t)) => t <= end.as_str(),
        }
    }
}

impl From<&entity::excluded_date::Model> for ExclusionWindow {
    fn from(row: &entity::excluded_date::Model) -> Self {
        Self {
            start_time: row.start_time.clone().filter(|s| !s.trim().is_empty()),
            end_time: row.end_time.clone().filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Pulls the first clock time out of a raw tee time cell and normalizes it.
pub fn extract_time(tee_time_raw: &str) -> Option<String> {
    CLOCK_TIME
        .find(tee_time_raw.trim())
        .and_then(|m| normalize_time(Some(m.as_str())))
}

/// Whether a tee time falls inside any of the windows.
///
/// `windows` must already be limited to the round's date.
pub fn is_excluded(tee_time_raw: &str, windows: &[ExclusionWindow]) -> bool {
    if windows.is_empty() {
        return false;
    }
    let time = extract_time(tee_time_raw);
    windows.iter().any(|w| w.covers(time.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_day_excludes_everything() {
        let windows = [ExclusionWindow::full_day()];
        assert!(is_excluded("7:00 AM", &windows));
        assert!(is_excluded("23:59", &windows));
        assert!(is_excluded("not a time", &windows));
        assert!(is_excluded("", &windows));
    }

    #[test]
    fn no_windows_excludes_nothing() {
        assert!(!is_excluded("8:00", &[]));
    }

    #[test]
    fn ranged_window_is_inclusive() {
        let windows = [ExclusionWindow::between("08:00", "10:30")];
        assert!(is_excluded("8:00 AM", &windows));
        assert!(is_excluded("10:30", &windows));
        assert!(is_excluded("9:15:00", &windows));
        assert!(!is_excluded("7:59 AM", &windows));
        assert!(!is_excluded("10:31", &windows));
        assert!(!is_excluded("1:00 PM", &windows));
    }

    #[test]
    fn window_bounds_may_be_twelve_hour() {
        let windows = [ExclusionWindow::between("1:00 PM", "3:00 PM")];
        assert!(is_excluded("14:10", &windows));
        assert!(!is_excluded("12:50 PM", &windows));
    }

    #[test]
    fn open_ended_windows() {
        let afternoon = [ExclusionWindow::from_start("12:00")];
        assert!(is_excluded("12:00 PM", &afternoon));
        assert!(is_excluded("4:40 PM", &afternoon));
        assert!(!is_excluded("11:59 AM", &afternoon));

        let morning = [ExclusionWindow::until("09:00")];
        assert!(is_excluded("6:30 AM", &morning));
        assert!(!is_excluded("9:01", &morning));
    }

    #[test]
    fn unreadable_time_only_matches_full_day() {
        let windows = [ExclusionWindow::from_start("06:00")];
        assert!(!is_excluded("shotgun", &windows));
    }

    #[test]
    fn time_is_found_inside_noise() {
        assert_eq!(extract_time("Tee 7:42 am (front)").as_deref(), Some("07:42"));
        assert_eq!(extract_time("no clock here"), None);
    }

    #[test]
    fn any_matching_window_wins() {
        let windows = [
            ExclusionWindow::between("06:00", "07:00"),
            ExclusionWindow::between("15:00", "16:00"),
        ];
        assert!(is_excluded("3:30 PM", &windows));
        assert!(!is_excluded("11:00", &windows));
    }
}
