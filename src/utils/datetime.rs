//! Date and time utility functions
//!
//! Attendance dates travel as `YYYY-MM-DD` strings and capture timestamps as
//! `YYYY-MM-DD HH:MM:SS`, both in device-local time. Keeping them as text means
//! lexicographic comparison in SQL matches chronological order.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Date format shared by the local store and the wire protocol
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Capture timestamp format (no fractional seconds, space separated)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a date string in YYYY-MM-DD format to NaiveDate
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT)
}

/// Format a NaiveDate to YYYY-MM-DD string
pub fn format_ymd(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format current local date to YYYY-MM-DD string
pub fn format_today() -> String {
    format_ymd(today())
}

/// Current local wall-clock time, truncated to the second
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Format a capture timestamp
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// RFC 3339 UTC timestamp used for bookkeeping columns (session, schema versions)
pub fn utc_now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// First date that survives the retention sweep.
///
/// Uploaded events dated strictly before the returned day are eligible for deletion.
pub fn retention_cutoff(today: NaiveDate, retention_days: u32) -> NaiveDate {
    today - Duration::days(i64::from(retention_days))
}

/// Millisecond timestamp appended to GET requests so intermediaries never serve a cached snapshot
pub fn cache_buster() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Describe an RFC 3339 timestamp relative to today ("today at 14:05", "3 days ago")
pub fn format_relative(timestamp: &str) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let local = parsed.with_timezone(&Local);
    let days = (today() - local.date_naive()).num_days();
    let time = local.format("%H:%M");

    match days {
        0 => format!("today at {time}"),
        1 => format!("yesterday at {time}"),
        d if d > 1 && d <= 30 => format!("{d} days ago"),
        _ => local.format(DATE_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_cutoff() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(
            retention_cutoff(today, 50),
            NaiveDate::from_ymd_opt(2025, 2, 9).unwrap()
        );
    }

    #[test]
    fn test_timestamp_has_no_fraction() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_milli_opt(9, 30, 5, 250)
            .unwrap();
        assert_eq!(format_timestamp(ts), "2025-01-15 09:30:05");
    }

    #[test]
    fn test_format_relative_falls_back_on_garbage() {
        assert_eq!(format_relative("not a date"), "not a date");
    }
}
