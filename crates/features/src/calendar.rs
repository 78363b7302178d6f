//! Calendar features derived from a single timestamp.

use crate::reattach::Reattacher;
use crate::series::{FeatureColumn, FeatureSeries};
use chrono::{Datelike, Timelike};
use fraud_core::config::DatetimeComponent;
use fraud_core::{ts_to_datetime, RecordStore, Result, TimestampNs};
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Minute of the day, 0..1440.
#[inline]
fn minute_of_day(ts: TimestampNs) -> u32 {
    let dt = ts_to_datetime(ts);
    dt.hour() * 60 + dt.minute()
}

/// Integer value of a component; `None` for `Time`, which is text.
fn numeric_component(ts: TimestampNs, component: DatetimeComponent) -> Option<u32> {
    let dt = ts_to_datetime(ts);
    match component {
        DatetimeComponent::Month => Some(dt.month()),
        DatetimeComponent::Day => Some(dt.day()),
        DatetimeComponent::Hour => Some(dt.hour()),
        DatetimeComponent::Minute => Some(dt.minute()),
        DatetimeComponent::Time => None,
    }
}

/// Extract a calendar component of a timestamp column.
///
/// Numeric components produce an integer column, `Time` produces `HH:MM`
/// text. Missing timestamps give `None`.
pub fn datetime_component(
    store: &RecordStore,
    time_field: &str,
    component: DatetimeComponent,
) -> Result<FeatureColumn> {
    let timestamps = store.timestamps(time_field)?;
    let reattacher = Reattacher::new(store);
    let name = format!("{time_field}_{}", component.as_str());

    let column = if component == DatetimeComponent::Time {
        let values = timestamps
            .iter()
            .map(|ts| ts.map(|t| ts_to_datetime(t).format("%H:%M").to_string()))
            .collect();
        FeatureColumn::Text(reattacher.aligned(name, values)?)
    } else {
        let values = timestamps
            .iter()
            .map(|ts| ts.and_then(|t| numeric_component(t, component)))
            .collect();
        FeatureColumn::Integer(reattacher.aligned(name, values)?)
    };
    Ok(column)
}

/// Relative activity of each record's minute of the day.
///
/// The number of records sharing the record's `HH:MM` bucket divided by the
/// mean bucket size over all observed buckets. Records with a missing
/// timestamp get `0.0`.
pub fn time_of_day_activity(store: &RecordStore, time_field: &str) -> Result<FeatureSeries<f64>> {
    let timestamps = store.timestamps(time_field)?;

    let mut buckets: HashMap<u32, f64> = HashMap::new();
    for ts in timestamps.iter().flatten() {
        *buckets.entry(minute_of_day(*ts)).or_insert(0.0) += 1.0;
    }

    let mean = if buckets.is_empty() {
        0.0
    } else {
        buckets.values().mean()
    };

    let values = timestamps
        .iter()
        .map(|ts| match ts {
            Some(t) if mean > 0.0 => buckets.get(&minute_of_day(*t)).copied().unwrap_or(0.0) / mean,
            _ => 0.0,
        })
        .collect();

    Reattacher::new(store).aligned(format!("{time_field}_activity"), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fraud_core::{FieldValue, Record, NANOS_PER_MINUTE, NANOS_PER_SECOND};

    // 2024-03-15T13:45:30Z
    const TS: i64 = 1_710_510_330 * NANOS_PER_SECOND;

    fn store(ts: &[Option<i64>]) -> RecordStore {
        RecordStore::new(
            vec!["created".into()],
            ts.iter()
                .enumerate()
                .map(|(i, t)| {
                    Record::new(
                        i as u64,
                        vec![t.map(FieldValue::Timestamp).unwrap_or(FieldValue::Null)],
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_components() {
        let s = store(&[Some(TS), None]);
        let expect = [
            (DatetimeComponent::Month, 3),
            (DatetimeComponent::Day, 15),
            (DatetimeComponent::Hour, 13),
            (DatetimeComponent::Minute, 45),
        ];
        for (component, value) in expect {
            match datetime_component(&s, "created", component).unwrap() {
                FeatureColumn::Integer(series) => {
                    assert_eq!(series.values(), &[Some(value), None]);
                }
                other => panic!("unexpected column {other:?}"),
            }
        }
    }

    #[test]
    fn test_numeric_component_excludes_time() {
        assert_eq!(numeric_component(TS, DatetimeComponent::Minute), Some(45));
        assert_eq!(numeric_component(TS, DatetimeComponent::Time), None);
    }

    #[test]
    fn test_time_component() {
        let s = store(&[Some(TS)]);
        let column = datetime_component(&s, "created", DatetimeComponent::Time).unwrap();
        assert_eq!(column.name(), "created_time");
        match column {
            FeatureColumn::Text(series) => assert_eq!(series.values(), &[Some("13:45".to_string())]),
            other => panic!("unexpected column {other:?}"),
        }
    }

    #[test]
    fn test_activity_ratio() {
        // Buckets: 13:45 x3, 13:46 x1 -> mean 2
        let s = store(&[
            Some(TS),
            Some(TS + 10 * NANOS_PER_SECOND),
            Some(TS - 20 * NANOS_PER_SECOND),
            Some(TS + NANOS_PER_MINUTE),
            None,
        ]);
        let activity = time_of_day_activity(&s, "created").unwrap();
        let v = activity.values();
        assert_relative_eq!(v[0], 1.5);
        assert_relative_eq!(v[1], 1.5);
        assert_relative_eq!(v[2], 1.5);
        assert_relative_eq!(v[3], 0.5);
        assert_relative_eq!(v[4], 0.0);
    }

    #[test]
    fn test_activity_all_missing() {
        let s = store(&[None, None]);
        let activity = time_of_day_activity(&s, "created").unwrap();
        assert_eq!(activity.values(), &[0.0, 0.0]);
    }
}
