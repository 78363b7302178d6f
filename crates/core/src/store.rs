//! In-memory record store.
//!
//! The store is the read-only input of every feature computation. Records
//! keep the order they were loaded in; that order is the alignment target
//! of every derived series.

use crate::error::{Error, Result};
use crate::types::{FieldValue, GroupKey, Record, RecordId, TimestampNs};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered, indexed collection of transaction records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordStore {
    /// Column names, aligned with each record's values.
    columns: Vec<String>,
    /// Records in original order.
    records: Vec<Record>,
}

impl RecordStore {
    /// Create a store, checking row widths and identity uniqueness.
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Result<Self> {
        let mut seen_cols = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen_cols.insert(col.as_str()) {
                return Err(Error::validation(format!("duplicate column '{col}'")));
            }
        }

        let mut seen_ids = HashSet::with_capacity(records.len());
        for record in &records {
            if record.values.len() != columns.len() {
                return Err(Error::validation(format!(
                    "record {} has {} values, expected {}",
                    record.id,
                    record.values.len(),
                    columns.len()
                )));
            }
            if !seen_ids.insert(record.id) {
                return Err(Error::data_integrity(format!(
                    "record {} appears more than once",
                    record.id
                )));
            }
        }

        Ok(Self { columns, records })
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in original order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record identities in original order.
    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.records.iter().map(|r| r.id)
    }

    /// Position of a column, or a validation error if it doesn't exist.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::validation(format!("missing required field '{name}'")))
    }

    /// All values of a column, in original order.
    pub fn column(&self, name: &str) -> Result<Vec<&FieldValue>> {
        let idx = self.column_index(name)?;
        Ok(self.records.iter().map(|r| &r.values[idx]).collect())
    }

    /// Timestamps of a column; `None` marks a missing timestamp.
    ///
    /// Fails if any non-null value is not a timestamp.
    pub fn timestamps(&self, name: &str) -> Result<Vec<Option<TimestampNs>>> {
        let idx = self.column_index(name)?;
        self.records
            .iter()
            .map(|r| match &r.values[idx] {
                FieldValue::Timestamp(ts) => Ok(Some(*ts)),
                FieldValue::Null => Ok(None),
                other => Err(Error::validation(format!(
                    "field '{name}' of record {} is a {}, expected a timestamp",
                    r.id,
                    other.type_name()
                ))),
            })
            .collect()
    }

    /// Composite keys built from the given fields, in original order.
    pub fn keys(&self, fields: &[String]) -> Result<Vec<GroupKey>> {
        let indices = fields
            .iter()
            .map(|f| self.column_index(f))
            .collect::<Result<Vec<_>>>()?;

        Ok(self
            .records
            .iter()
            .map(|r| GroupKey(indices.iter().map(|&i| r.values[i].clone()).collect()))
            .collect())
    }

    /// Return a new store with an extra column appended.
    ///
    /// `values` must be aligned with the current record order.
    pub fn with_column(&self, name: impl Into<String>, values: Vec<FieldValue>) -> Result<Self> {
        let name = name.into();
        if self.columns.iter().any(|c| *c == name) {
            return Err(Error::validation(format!("column '{name}' already exists")));
        }
        if values.len() != self.records.len() {
            return Err(Error::data_integrity(format!(
                "column '{name}' has {} values for {} records",
                values.len(),
                self.records.len()
            )));
        }

        let mut columns = self.columns.clone();
        columns.push(name);

        let records = self
            .records
            .iter()
            .zip(values)
            .map(|(r, v)| {
                let mut values = r.values.clone();
                values.push(v);
                Record { id: r.id, values }
            })
            .collect();

        Ok(Self { columns, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample_store() -> RecordStore {
        RecordStore::new(
            cols(&["created", "merchant_id"]),
            vec![
                Record::new(10, vec![FieldValue::Timestamp(5), FieldValue::from("m1")]),
                Record::new(11, vec![FieldValue::Null, FieldValue::from("m2")]),
                Record::new(13, vec![FieldValue::Timestamp(1), FieldValue::from("m1")]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = RecordStore::new(
            cols(&["created"]),
            vec![
                Record::new(1, vec![FieldValue::Timestamp(0)]),
                Record::new(1, vec![FieldValue::Timestamp(1)]),
            ],
        );
        assert!(matches!(result, Err(Error::DataIntegrity(_))));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = RecordStore::new(
            cols(&["created", "merchant_id"]),
            vec![Record::new(1, vec![FieldValue::Timestamp(0)])],
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_timestamps() {
        let store = sample_store();
        assert_eq!(store.timestamps("created").unwrap(), vec![Some(5), None, Some(1)]);
        assert!(matches!(store.timestamps("merchant_id"), Err(Error::Validation(_))));
        assert!(matches!(store.timestamps("updated"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_keys() {
        let store = sample_store();
        let keys = store.keys(&cols(&["merchant_id"])).unwrap();
        assert_eq!(keys[0], keys[2]);
        assert_ne!(keys[0], keys[1]);

        let global = store.keys(&[]).unwrap();
        assert!(global.iter().all(|k| *k == GroupKey::global()));
    }

    #[test]
    fn test_with_column() {
        let store = sample_store();
        let extended = store
            .with_column("delta", vec![FieldValue::Null, FieldValue::Null, FieldValue::from(4.0)])
            .unwrap();
        assert_eq!(extended.columns().len(), 3);
        assert_eq!(extended.records()[2].values[2], FieldValue::from(4.0));

        assert!(store.with_column("created", vec![FieldValue::Null; 3]).is_err());
        assert!(matches!(
            store.with_column("short", vec![FieldValue::Null]),
            Err(Error::DataIntegrity(_))
        ));
    }
}
