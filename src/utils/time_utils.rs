use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::time::Duration;

pub struct TimeUtils;

impl TimeUtils {
    pub const SECS_IN_MIN: u64 = 60;
    pub const STANDARD_DATE_FORMAT: &str = "%Y-%m-%d";
    pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Naive layouts the backend has been seen to emit (Python `isoformat()` and friends).
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
}

/// Parse an alert timestamp. RFC 3339 first, then naive ISO-8601 read as local time.
pub fn parse_alert_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    TimeUtils::NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
    })
}

/// Local calendar day an instant falls on.
pub fn local_day(ts: &DateTime<Local>) -> NaiveDate {
    ts.date_naive()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Monitor-duration readout: `MM:SS`, minutes keep growing past 59.
pub fn format_monitor_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}",
        secs / TimeUtils::SECS_IN_MIN,
        secs % TimeUtils::SECS_IN_MIN
    )
}

pub fn format_display_time(ts: &DateTime<Local>) -> String {
    ts.format(TimeUtils::DISPLAY_TIME_FORMAT).to_string()
}
