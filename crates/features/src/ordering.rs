//! Ordering normalization.
//!
//! Produces a sorted view of a record store without touching it. Every entry
//! carries the record's identity and original position so derived values can
//! be reattached after any reordering.

use fraud_core::{GroupKey, RecordId, RecordStore, Result, TimestampNs};
use std::cmp::Ordering;
use std::ops::Range;

/// One record as seen by the temporal calculators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedEntry {
    /// Record identity.
    pub id: RecordId,
    /// Position in the source store.
    pub position: usize,
    /// Composite grouping key.
    pub key: GroupKey,
    /// Timestamp, `None` when missing.
    pub ts: Option<TimestampNs>,
}

/// Sort order of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// (key, timestamp): groups are contiguous.
    KeyThenTime,
    /// Timestamp only: groups are interleaved.
    TimeOnly,
}

/// A sorted, read-only view over a record store.
#[derive(Debug, Clone)]
pub struct OrderedView {
    entries: Vec<OrderedEntry>,
    order: SortOrder,
}

/// Compare optional timestamps with missing values last.
#[inline]
pub fn cmp_missing_last(a: Option<TimestampNs>, b: Option<TimestampNs>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl OrderedView {
    /// Build a view with the given order. Ties keep original store order.
    pub fn build(
        store: &RecordStore,
        time_field: &str,
        key_fields: &[String],
        order: SortOrder,
    ) -> Result<Self> {
        let timestamps = store.timestamps(time_field)?;
        let keys = store.keys(key_fields)?;

        let mut entries: Vec<OrderedEntry> = store
            .ids()
            .zip(keys)
            .zip(timestamps)
            .enumerate()
            .map(|(position, ((id, key), ts))| OrderedEntry {
                id,
                position,
                key,
                ts,
            })
            .collect();

        match order {
            SortOrder::KeyThenTime => entries.sort_by(|a, b| {
                a.key
                    .cmp(&b.key)
                    .then_with(|| cmp_missing_last(a.ts, b.ts))
                    .then(a.position.cmp(&b.position))
            }),
            SortOrder::TimeOnly => entries.sort_by(|a, b| {
                cmp_missing_last(a.ts, b.ts).then(a.position.cmp(&b.position))
            }),
        }

        Ok(Self { entries, order })
    }

    /// Sorted entries.
    pub fn entries(&self) -> &[OrderedEntry] {
        &self.entries
    }

    /// Sort order of this view.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index ranges of the contiguous groups.
    ///
    /// Only meaningful for `SortOrder::KeyThenTime` views.
    pub fn group_ranges(&self) -> Vec<Range<usize>> {
        group_ranges(&self.entries)
    }
}

/// Index ranges of runs of equal keys in a slice of entries.
pub fn group_ranges(entries: &[OrderedEntry]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for i in 1..=entries.len() {
        if i == entries.len() || entries[i].key != entries[start].key {
            if start < i {
                ranges.push(start..i);
            }
            start = i;
        }
    }
    ranges
}

/// Sort by (grouping key(s), timestamp), stable with respect to store order.
pub fn normalize(store: &RecordStore, time_field: &str, key_fields: &[String]) -> Result<OrderedView> {
    OrderedView::build(store, time_field, key_fields, SortOrder::KeyThenTime)
}

/// Sort globally by timestamp, keeping each entry's key for later filtering.
pub fn normalize_by_time(
    store: &RecordStore,
    time_field: &str,
    key_fields: &[String],
) -> Result<OrderedView> {
    OrderedView::build(store, time_field, key_fields, SortOrder::TimeOnly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraud_core::{Error, FieldValue, Record};

    fn store() -> RecordStore {
        let rows = [
            (0, Some(30), "b"),
            (1, Some(10), "a"),
            (2, None, "a"),
            (3, Some(10), "b"),
            (4, Some(5), "a"),
            (5, Some(10), "a"),
        ];
        RecordStore::new(
            vec!["created".into(), "merchant_id".into()],
            rows.iter()
                .map(|(id, ts, m)| {
                    Record::new(
                        *id,
                        vec![
                            ts.map(FieldValue::Timestamp).unwrap_or(FieldValue::Null),
                            FieldValue::from(*m),
                        ],
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn ids(view: &OrderedView) -> Vec<u64> {
        view.entries().iter().map(|e| e.id.0).collect()
    }

    #[test]
    fn test_key_then_time() {
        let view = normalize(&store(), "created", &["merchant_id".to_string()]).unwrap();
        // a: 5, 10 (pos 1), 10 (pos 5), missing; b: 10, 30
        assert_eq!(ids(&view), vec![4, 1, 5, 2, 3, 0]);
        assert_eq!(view.group_ranges(), vec![0..4, 4..6]);
    }

    #[test]
    fn test_time_only() {
        let view = normalize_by_time(&store(), "created", &["merchant_id".to_string()]).unwrap();
        assert_eq!(ids(&view), vec![4, 1, 3, 5, 0, 2]);
        // Keys are kept even though groups are interleaved
        assert_eq!(view.entries()[2].key, GroupKey(vec![FieldValue::from("b")]));
    }

    #[test]
    fn test_store_untouched() {
        let s = store();
        let before: Vec<_> = s.ids().collect();
        let _ = normalize(&s, "created", &["merchant_id".to_string()]).unwrap();
        assert_eq!(s.ids().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_missing_field() {
        assert!(matches!(
            normalize(&store(), "updated", &[]),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            normalize(&store(), "created", &["card".to_string()]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_group_ranges_empty() {
        assert!(group_ranges(&[]).is_empty());
    }

    #[test]
    fn test_cmp_missing_last() {
        assert_eq!(cmp_missing_last(Some(1), None), Ordering::Less);
        assert_eq!(cmp_missing_last(None, Some(1)), Ordering::Greater);
        assert_eq!(cmp_missing_last(Some(2), Some(1)), Ordering::Greater);
    }
}
