//! Lenient timestamp parsing for backend-produced dates.
//!
//! The API emits ISO-8601 timestamps both with an offset (`...Z`,
//! `...+00:00`) and without one (naive UTC, as produced by `isoformat()` on a
//! naive datetime). Both forms are accepted and normalized to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse a timestamp string in any of the accepted forms.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Deserialize an optional timestamp; unparseable values become `None`.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse))
}

/// Serialize an optional timestamp as RFC 3339.
pub fn serialize_opt<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse("2024-03-05T10:20:30Z").unwrap();
        assert_eq!(dt.hour(), 10);
        let dt = parse("2024-03-05T10:20:30+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_parse_naive_isoformat() {
        let dt = parse("2024-03-05T10:20:30.123456").unwrap();
        assert_eq!(dt.day(), 5);
        assert_eq!(dt.second(), 30);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse("2024-03-05").unwrap();
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("yesterday"), None);
    }
}
