//! Human-readable dates for note listings.
//!
//! Formats timestamps as "Today", "Yesterday", "3 days ago", and falls
//! back to the calendar date for anything older than a week.

use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Format `at` relative to `now`.
///
/// Supports:
/// - "Today": less than one day apart
/// - "Yesterday": one to two days apart
/// - "N days ago": up to a week apart
/// - "YYYY-MM-DD": anything further
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match days_between(at, now) {
        0 | 1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        days if days <= 7 => format!("{} days ago", days - 1),
        _ => at.format("%Y-%m-%d").to_string(),
    }
}

/// Whole days between two instants, rounded up.
fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let millis = (b - a).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_today() {
        assert_eq!(format_relative(now(), now()), "Today");
        assert_eq!(format_relative(now() - Duration::hours(23), now()), "Today");
    }

    #[test]
    fn test_yesterday() {
        assert_eq!(format_relative(now() - Duration::hours(30), now()), "Yesterday");
    }

    #[test]
    fn test_days_ago() {
        assert_eq!(format_relative(now() - Duration::hours(60), now()), "2 days ago");
        assert_eq!(format_relative(now() - Duration::days(7), now()), "6 days ago");
    }

    #[test]
    fn test_older_shows_date() {
        assert_eq!(
            format_relative(now() - Duration::days(30), now()),
            "2024-05-16"
        );
    }
}
