//! Timestamp decoding for history records.
//!
//! The backend serializes message timestamps either as an ISO-like string or
//! as a 7-component numeric tuple (year, month, day, hour, minute, second,
//! nanosecond). Anything unparseable yields the current time rather than an
//! error: a bad timestamp must never sink a history load.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use serde::Deserialize;

/// Raw timestamp as found on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// `[year, month, day, hour, minute, second, nano]`; trailing components
    /// may be absent.
    Parts(Vec<i64>),
    Text(String),
}

/// Decodes an optional raw timestamp, falling back to `Local::now()`.
pub fn parse_timestamp(raw: Option<&RawTimestamp>) -> DateTime<Local> {
    raw.and_then(decode).unwrap_or_else(Local::now)
}

/// Decodes a conversation creation time, which is always a string when
/// present. Unlike [`parse_timestamp`] there is no now-fallback; an
/// unparseable value just means no timestamp to show.
pub fn parse_create_time(raw: Option<&str>) -> Option<DateTime<Local>> {
    from_text(raw?)
}

fn decode(raw: &RawTimestamp) -> Option<DateTime<Local>> {
    match raw {
        RawTimestamp::Parts(parts) => from_parts(parts),
        RawTimestamp::Text(text) => from_text(text),
    }
}

fn from_parts(parts: &[i64]) -> Option<DateTime<Local>> {
    let year = *parts.first()?;
    let month = parts.get(1).copied().unwrap_or(1);
    let day = parts.get(2).copied().unwrap_or(1);
    let hour = parts.get(3).copied().unwrap_or(0);
    let minute = parts.get(4).copied().unwrap_or(0);
    let second = parts.get(5).copied().unwrap_or(0);
    let nano = parts.get(6).copied().unwrap_or(0);

    let base = Local
        .with_ymd_and_hms(
            i32::try_from(year).ok()?,
            u32::try_from(month).ok()?,
            u32::try_from(day).ok()?,
            u32::try_from(hour).ok()?,
            u32::try_from(minute).ok()?,
            u32::try_from(second).ok()?,
        )
        .single()?;

    // Sub-second precision is truncated to milliseconds.
    base.checked_add_signed(TimeDelta::milliseconds(nano / 1_000_000))
}

fn from_text(text: &str) -> Option<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Local));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return naive.and_local_timezone(Local).single();
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| naive.and_local_timezone(Local).single());
    }

    None
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    /// Full 7-component tuple converts nanoseconds to milliseconds.
    #[test]
    fn test_full_tuple_parses_with_millis() {
        let raw = RawTimestamp::Parts(vec![2024, 3, 5, 9, 30, 0, 500_000_000]);
        let parsed = parse_timestamp(Some(&raw));

        let expected = Local
            .with_ymd_and_hms(2024, 3, 5, 9, 30, 0)
            .single()
            .unwrap()
            + TimeDelta::milliseconds(500);
        assert_eq!(parsed, expected);
    }

    /// Short tuple defaults month/day to 1 and the rest to 0.
    #[test]
    fn test_short_tuple_defaults() {
        let raw = RawTimestamp::Parts(vec![2024]);
        let parsed = parse_timestamp(Some(&raw));

        let expected = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
        assert_eq!(parsed, expected);
    }

    /// Three-component tuple is midnight on that day.
    #[test]
    fn test_date_only_tuple() {
        let raw = RawTimestamp::Parts(vec![2024, 1, 1]);
        let parsed = parse_timestamp(Some(&raw));

        let expected = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.nanosecond(), 0);
    }

    /// RFC 3339 strings parse into local time.
    #[test]
    fn test_rfc3339_string() {
        let raw = RawTimestamp::Text("2024-03-05T09:30:00+00:00".to_string());
        let parsed = parse_timestamp(Some(&raw));

        let expected = DateTime::parse_from_rfc3339("2024-03-05T09:30:00+00:00")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(parsed, expected);
    }

    /// Naive datetime strings are read as local time.
    #[test]
    fn test_naive_datetime_string() {
        let raw = RawTimestamp::Text("2024-03-05 09:30:00".to_string());
        let parsed = parse_timestamp(Some(&raw));

        let expected = Local
            .with_ymd_and_hms(2024, 3, 5, 9, 30, 0)
            .single()
            .unwrap();
        assert_eq!(parsed, expected);
    }

    /// Garbage strings and absent values fall back to now, never error.
    #[test]
    fn test_unparseable_falls_back_to_now() {
        let before = Local::now();
        let garbage = RawTimestamp::Text("not a date".to_string());
        let parsed = parse_timestamp(Some(&garbage));
        let absent = parse_timestamp(None);
        let after = Local::now();

        assert!(parsed >= before && parsed <= after);
        assert!(absent >= before && absent <= after);
    }

    /// Empty tuple has no year and falls back to now.
    #[test]
    fn test_empty_tuple_falls_back_to_now() {
        let before = Local::now();
        let parsed = parse_timestamp(Some(&RawTimestamp::Parts(vec![])));
        assert!(parsed >= before);
    }

    /// Creation times parse when well formed and are `None` otherwise.
    #[test]
    fn test_parse_create_time() {
        let parsed = parse_create_time(Some("2024-03-05 09:30:00")).unwrap();
        let expected = Local
            .with_ymd_and_hms(2024, 3, 5, 9, 30, 0)
            .single()
            .unwrap();
        assert_eq!(parsed, expected);

        assert!(parse_create_time(Some("soon")).is_none());
        assert!(parse_create_time(None).is_none());
    }

    /// Untagged deserialization accepts both wire forms.
    #[test]
    fn test_deserialize_both_forms() {
        let tuple: RawTimestamp = serde_json::from_str("[2024,3,5,9,30,0,0]").unwrap();
        assert_eq!(tuple, RawTimestamp::Parts(vec![2024, 3, 5, 9, 30, 0, 0]));

        let text: RawTimestamp = serde_json::from_str("\"2024-03-05T09:30:00Z\"").unwrap();
        assert_eq!(text, RawTimestamp::Text("2024-03-05T09:30:00Z".to_string()));
    }
}
