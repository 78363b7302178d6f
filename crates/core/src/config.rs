//! Configuration structures for the fraud-features system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// Main configuration for a feature run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store construction configuration.
    pub ingest: IngestConfig,
    /// Worker pool configuration.
    pub parallel: ParallelConfig,
    /// Trailing-window defaults.
    pub window: WindowDefaults,
    /// Features to compute, in output order.
    pub features: Vec<FeatureRequest>,
}

impl Config {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check every feature request and reject duplicate output names.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for request in &self.features {
            request.validate()?;
            if !names.insert(request.name()) {
                return Err(Error::config(format!(
                    "feature '{}' is declared more than once",
                    request.name()
                )));
            }
        }
        Ok(())
    }
}

/// How unparseable timestamps are handled when building a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// Fail store construction on the first unparseable value.
    Reject,
    /// Drop the row before the store is built.
    Exclude,
    /// Keep the row with a missing timestamp; it sorts last.
    #[default]
    SortLast,
}

/// Store construction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Unparseable timestamp policy.
    pub parse_policy: ParsePolicy,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of parallel workers (0 = auto).
    pub workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

/// Execution strategy of the trailing-window counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStrategy {
    /// Group-aligned partitions processed in parallel.
    #[default]
    ByGroup,
    /// One global pass over the normalized sequence.
    Sequential,
}

/// Trailing-window defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowDefaults {
    /// Execution strategy.
    pub strategy: WindowStrategy,
}

/// Calendar component extracted from a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatetimeComponent {
    Month,
    Day,
    Hour,
    Minute,
    /// Time of day as `HH:MM`.
    Time,
}

impl DatetimeComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatetimeComponent::Month => "month",
            DatetimeComponent::Day => "day",
            DatetimeComponent::Hour => "hour",
            DatetimeComponent::Minute => "minute",
            DatetimeComponent::Time => "time",
        }
    }
}

impl FromStr for DatetimeComponent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "month" => Ok(DatetimeComponent::Month),
            "day" => Ok(DatetimeComponent::Day),
            "hour" => Ok(DatetimeComponent::Hour),
            "minute" => Ok(DatetimeComponent::Minute),
            "time" => Ok(DatetimeComponent::Time),
            other => Err(Error::validation(format!(
                "invalid datetime component '{other}', expected one of month, day, hour, minute, time"
            ))),
        }
    }
}

/// A single feature to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureRequest {
    /// Seconds since the previous record of the same group.
    TimeDelta {
        name: String,
        time_field: String,
        group_field: String,
    },
    /// Records of the same composite key within a trailing interval.
    WindowCount {
        name: String,
        time_field: String,
        key_fields: Vec<String>,
        interval_minutes: f64,
    },
    /// Seconds spanned by the last `n` records in global time order.
    NthInterval {
        name: String,
        time_field: String,
        n: usize,
    },
    /// A calendar component of a timestamp.
    DatetimeComponent {
        name: String,
        time_field: String,
        component: DatetimeComponent,
    },
    /// Relative activity of a record's minute of the day.
    TimeOfDayActivity { name: String, time_field: String },
    /// Bank identification number (first six characters).
    CardBin { name: String, card_field: String },
    /// Last character of the card number.
    CardCheckDigit { name: String, card_field: String },
}

impl FeatureRequest {
    /// Output column name.
    pub fn name(&self) -> &str {
        match self {
            FeatureRequest::TimeDelta { name, .. }
            | FeatureRequest::WindowCount { name, .. }
            | FeatureRequest::NthInterval { name, .. }
            | FeatureRequest::DatetimeComponent { name, .. }
            | FeatureRequest::TimeOfDayActivity { name, .. }
            | FeatureRequest::CardBin { name, .. }
            | FeatureRequest::CardCheckDigit { name, .. } => name,
        }
    }

    /// Check parameters that don't depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.name().is_empty() {
            return Err(Error::validation("feature name must not be empty"));
        }
        match self {
            FeatureRequest::WindowCount {
                interval_minutes, ..
            } => validate_interval_minutes(*interval_minutes).map(|_| ()),
            FeatureRequest::NthInterval { n, .. } if *n < 1 => Err(Error::validation(format!(
                "n must be at least 1, got {n}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Convert a trailing interval in minutes to nanoseconds.
///
/// Rejects non-finite, zero, negative and sub-nanosecond intervals.
pub fn validate_interval_minutes(interval_minutes: f64) -> Result<i64> {
    if !interval_minutes.is_finite() || interval_minutes <= 0.0 {
        return Err(Error::validation(format!(
            "interval must be a positive number of minutes, got {interval_minutes}"
        )));
    }
    let nanos = (interval_minutes * crate::types::NANOS_PER_MINUTE as f64).round();
    if nanos < 1.0 || nanos > i64::MAX as f64 {
        return Err(Error::validation(format!(
            "interval of {interval_minutes} minutes is out of range"
        )));
    }
    Ok(nanos as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ingest.parse_policy, ParsePolicy::SortLast);
        assert_eq!(config.parallel.workers, 0);
        assert_eq!(config.window.strategy, WindowStrategy::ByGroup);
        assert!(config.features.is_empty());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "parallel": { "workers": 4 },
            "features": [
                { "kind": "time_delta", "name": "merchant_delta",
                  "time_field": "created", "group_field": "merchant_id" },
                { "kind": "window_count", "name": "card_tx_10m",
                  "time_field": "created", "key_fields": ["card", "merchant_id"],
                  "interval_minutes": 10 },
                { "kind": "datetime_component", "name": "hour",
                  "time_field": "created", "component": "hour" }
            ]
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.parallel.workers, 4);
        assert_eq!(config.features.len(), 3);
        assert_eq!(config.features[1].name(), "card_tx_10m");
    }

    #[test]
    fn test_rejects_invalid_requests() {
        let bad_interval = r#"{ "features": [ { "kind": "window_count", "name": "w",
            "time_field": "created", "key_fields": [], "interval_minutes": 0 } ] }"#;
        assert!(matches!(
            Config::from_json_str(bad_interval),
            Err(Error::Validation(_))
        ));

        let bad_n = r#"{ "features": [ { "kind": "nth_interval", "name": "n",
            "time_field": "created", "n": 0 } ] }"#;
        assert!(matches!(Config::from_json_str(bad_n), Err(Error::Validation(_))));

        let duplicate = r#"{ "features": [
            { "kind": "card_bin", "name": "x", "card_field": "card" },
            { "kind": "card_check_digit", "name": "x", "card_field": "card" } ] }"#;
        assert!(matches!(Config::from_json_str(duplicate), Err(Error::Config(_))));
    }

    #[test]
    fn test_interval_conversion() {
        assert_eq!(validate_interval_minutes(1.0).unwrap(), 60_000_000_000);
        assert_eq!(validate_interval_minutes(0.5).unwrap(), 30_000_000_000);
        assert!(validate_interval_minutes(-1.0).is_err());
        assert!(validate_interval_minutes(f64::NAN).is_err());
    }

    #[test]
    fn test_component_from_str() {
        assert_eq!("hour".parse::<DatetimeComponent>().unwrap(), DatetimeComponent::Hour);
        assert!(matches!(
            "week".parse::<DatetimeComponent>(),
            Err(Error::Validation(_))
        ));
    }
}
