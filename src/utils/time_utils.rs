use chrono::{DateTime, Utc};

pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn how_many_seconds_ago(past_timestamp_ms: i64) -> i64 {
    // How many seconds ago was the event described by `past_timestamp_ms` ?
    (now_timestamp_ms() - past_timestamp_ms) / 1000
}

pub fn epoch_ms_to_utc(epoch_ms: i64) -> String {
    // Used for display purposes
    match DateTime::from_timestamp_millis(epoch_ms) {
        Some(dt) => format!("{}", dt.format(STANDARD_TIME_FORMAT)),
        None => "invalid timestamp".to_string(),
    }
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    format!("{}d", days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5_000), "5s");
        assert_eq!(format_duration(120_000), "2m");
        assert_eq!(format_duration(3 * 3_600_000), "3h");
        assert_eq!(format_duration(49 * 3_600_000), "2d");
    }

    #[test]
    fn test_epoch_ms_to_utc() {
        assert_eq!(epoch_ms_to_utc(0), "1970-01-01 00:00:00");
    }
}
