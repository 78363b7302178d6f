//! Core data types for the fraud-features system.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in nanoseconds since Unix epoch (UTC).
pub type TimestampNs = i64;

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Nanoseconds in one minute.
pub const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;

/// Convert a nanosecond span to fractional seconds.
#[inline]
pub fn nanos_to_seconds(span_ns: i64) -> f64 {
    span_seconds(span_ns, 0)
}

/// Seconds from `earlier` to `later`.
///
/// The difference is taken in `i128`, so any two timestamps give a finite
/// result even when their distance doesn't fit in an `i64`.
#[inline]
pub fn span_seconds(later: TimestampNs, earlier: TimestampNs) -> f64 {
    let span = later as i128 - earlier as i128;
    let per_second = NANOS_PER_SECOND as i128;
    (span / per_second) as f64 + (span % per_second) as f64 / NANOS_PER_SECOND as f64
}

/// Convert a nanosecond timestamp to a UTC datetime.
#[inline]
pub fn ts_to_datetime(ts_ns: TimestampNs) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_nanos(ts_ns)
}

/// Stable identity of a record, independent of any sort order.
///
/// This is the row label assigned by the cleaning layer, so it survives
/// row drops upstream and is not necessarily contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single field value of a record.
///
/// Totally ordered and hashable so any field can be part of a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldValue {
    /// Missing value. Null keys form their own group.
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    /// Nanoseconds since epoch.
    Timestamp(TimestampNs),
}

impl FieldValue {
    /// Is this a null value?
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Get the timestamp if this is a timestamp value.
    #[inline]
    pub fn as_timestamp(&self) -> Option<TimestampNs> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{}", x.0),
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts_to_datetime(*ts).to_rfc3339()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(OrderedFloat(x))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Composite grouping key: one value per requested key field.
///
/// An empty key puts every record in a single group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey(pub Vec<FieldValue>);

impl GroupKey {
    /// Key shared by every record when no key fields are given.
    pub fn global() -> Self {
        GroupKey(Vec::new())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

/// A transaction record: identity plus one value per store column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identity.
    pub id: RecordId,
    /// Values, aligned with the owning store's columns.
    pub values: Vec<FieldValue>,
}

impl Record {
    /// Create a new record.
    pub fn new(id: u64, values: Vec<FieldValue>) -> Self {
        Self {
            id: RecordId(id),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nanos_to_seconds() {
        assert_relative_eq!(nanos_to_seconds(5 * NANOS_PER_SECOND), 5.0);
        assert_relative_eq!(nanos_to_seconds(1_500_000), 0.0015);
        // Microsecond precision survives large spans
        let span = 86_400 * NANOS_PER_SECOND + 1_000;
        assert_relative_eq!(nanos_to_seconds(span), 86_400.000001, epsilon = 1e-9);
        assert_relative_eq!(nanos_to_seconds(-2 * NANOS_PER_SECOND), -2.0);
    }

    #[test]
    fn test_span_seconds_full_range() {
        assert_relative_eq!(span_seconds(7 * NANOS_PER_SECOND, 2 * NANOS_PER_SECOND), 5.0);
        // i64::MAX - i64::MIN overflows i64 but not the span
        let span = span_seconds(i64::MAX, i64::MIN);
        assert!(span.is_finite());
        assert_relative_eq!(span, 2.0 * 9_223_372_036.854_775_807, max_relative = 1e-12);
        assert_relative_eq!(span_seconds(i64::MIN, i64::MAX), -span);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from("merchant-1").to_string(), "merchant-1");
        assert_eq!(FieldValue::Int(4111).to_string(), "4111");
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(
            FieldValue::Timestamp(0).to_string(),
            "1970-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_group_key_ordering() {
        let a = GroupKey(vec![FieldValue::from("a"), FieldValue::Int(2)]);
        let b = GroupKey(vec![FieldValue::from("a"), FieldValue::Int(10)]);
        let c = GroupKey(vec![FieldValue::from("b"), FieldValue::Int(1)]);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "(a, 2)");
    }

    #[test]
    fn test_option_into_field_value() {
        let none: Option<i64> = None;
        assert_eq!(FieldValue::from(none), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(3.5)), FieldValue::from(3.5));
    }
}
