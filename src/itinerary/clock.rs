//! Parsing helpers for the timezone-naive wall-clock strings stored on trips.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Parses a local date-time such as `2025-06-01T08:00`. Offsets or a trailing
/// `Z` are ignored; the value is treated as wall-clock time.
pub fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    let raw = strip_offset(raw.trim().trim_end_matches('Z'));
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn strip_offset(raw: &str) -> &str {
    let Some(split) = raw.len().checked_sub(6).filter(|split| *split >= 16) else {
        return raw;
    };
    match (raw.get(..split), raw.get(split..)) {
        (Some(head), Some(tail))
            if (tail.starts_with('+') || tail.starts_with('-')) && tail.as_bytes()[3] == b':' =>
        {
            head
        }
        _ => raw,
    }
}

/// Calendar date of a date or date-time string.
pub fn date_part(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    parse_local(raw)
        .map(|dt| dt.date())
        .or_else(|| raw.get(..10).and_then(|head| head.parse().ok()))
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

/// Zero-padded `HH:MM` for a time-of-day string. Unparseable but non-empty
/// input is passed through so it still takes part in ordering.
pub fn normalize_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        parse_time(raw)
            .map(format_time)
            .unwrap_or_else(|| raw.to_string()),
    )
}

/// `HH:MM` of a date-time string, if it carries a time.
pub fn time_of(raw: &str) -> Option<String> {
    parse_local(raw).map(|dt| format_time(dt.time()))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_common_local_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(parse_local("2025-06-01T08:00"), Some(expected));
        assert_eq!(parse_local("2025-06-01 08:00:00"), Some(expected));
        assert_eq!(parse_local("2025-06-01T08:00:00Z"), Some(expected));
        assert_eq!(parse_local("2025-06-01T08:00:00+02:00"), Some(expected));
        assert_eq!(parse_local("2025-06-01 08:00+01:00"), Some(expected));
        assert_eq!(parse_local("tomorrow"), None);
    }

    #[test]
    fn date_part_accepts_plain_dates() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(date_part("2025-06-03"), Some(day));
        assert_eq!(date_part("2025-06-03T23:59"), Some(day));
        assert_eq!(date_part(""), None);
    }

    #[test]
    fn normalizes_times_to_zero_padded() {
        assert_eq!(normalize_time("9:05").as_deref(), Some("09:05"));
        assert_eq!(normalize_time("7:30 PM").as_deref(), Some("19:30"));
        assert_eq!(normalize_time("  ").as_deref(), None);
        assert_eq!(normalize_time("noon").as_deref(), Some("noon"));
        assert_eq!(time_of("2025-06-01T08:00").as_deref(), Some("08:00"));
    }
}
