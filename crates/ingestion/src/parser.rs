//! Timestamp parsing.
//!
//! Converts the cleaning layer's text timestamps into nanoseconds since
//! epoch. Values without an offset are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use fraud_core::{Error, Result, TimestampNs};

/// Naive datetime layouts, tried in order before RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
];

/// Date-only layouts, mapped to midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Text values that mean "no timestamp" rather than "bad timestamp".
const MISSING_MARKERS: &[&str] = &["", "nat", "nan", "null", "none"];

/// Parser for text timestamps.
#[derive(Debug, Clone, Default)]
pub struct TimestampParser {
    /// Extra layouts tried before the built-in ones.
    extra_formats: Vec<String>,
}

impl TimestampParser {
    /// Create a parser with the built-in layouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom chrono layout, tried before the built-in ones.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.extra_formats.push(format.into());
        self
    }

    /// Parse a text timestamp.
    ///
    /// Returns `Ok(None)` for a missing value and a parse error for text
    /// that matches no known layout.
    pub fn parse(&self, raw: &str) -> Result<Option<TimestampNs>> {
        let text = raw.trim();
        if MISSING_MARKERS.iter().any(|m| text.eq_ignore_ascii_case(m)) {
            return Ok(None);
        }

        let naive = self
            .extra_formats
            .iter()
            .map(String::as_str)
            .chain(NAIVE_FORMATS.iter().copied())
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok());

        let parsed = match naive {
            Some(dt) => Some(dt.and_utc()),
            None => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    DATE_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                }),
        };

        let dt = parsed.ok_or_else(|| Error::parse(format!("unparseable timestamp '{text}'")))?;
        dt.timestamp_nanos_opt()
            .map(Some)
            .ok_or_else(|| Error::parse(format!("timestamp '{text}' is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraud_core::NANOS_PER_SECOND;

    // 2024-01-01T00:00:00Z
    const JAN_1_2024: i64 = 1_704_067_200 * NANOS_PER_SECOND;

    #[test]
    fn test_naive_formats() {
        let parser = TimestampParser::new();
        assert_eq!(parser.parse("2024-01-01 00:00:00").unwrap(), Some(JAN_1_2024));
        assert_eq!(
            parser.parse("2024-01-01T00:00:01.250").unwrap(),
            Some(JAN_1_2024 + NANOS_PER_SECOND + 250_000_000)
        );
        assert_eq!(parser.parse("2024-01-01 00:01").unwrap(), Some(JAN_1_2024 + 60 * NANOS_PER_SECOND));
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let parser = TimestampParser::new();
        assert_eq!(
            parser.parse("2024-01-01T07:00:00+07:00").unwrap(),
            Some(JAN_1_2024)
        );
        assert_eq!(parser.parse("2024-01-01T00:00:00Z").unwrap(), Some(JAN_1_2024));
    }

    #[test]
    fn test_date_only() {
        let parser = TimestampParser::new();
        assert_eq!(parser.parse("2024-01-01").unwrap(), Some(JAN_1_2024));
    }

    #[test]
    fn test_microsecond_precision() {
        let parser = TimestampParser::new();
        let ts = parser.parse("2024-01-01 00:00:00.000123").unwrap().unwrap();
        assert_eq!(ts - JAN_1_2024, 123_000);
    }

    #[test]
    fn test_missing_and_unparseable() {
        let parser = TimestampParser::new();
        assert_eq!(parser.parse("").unwrap(), None);
        assert_eq!(parser.parse(" NaT ").unwrap(), None);
        assert!(matches!(parser.parse("yesterday"), Err(Error::Parse(_))));
        assert!(matches!(parser.parse("2024-13-45"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_custom_format() {
        let parser = TimestampParser::new().with_format("%d.%m.%Y %H:%M");
        assert_eq!(parser.parse("01.01.2024 00:00").unwrap(), Some(JAN_1_2024));
    }
}
