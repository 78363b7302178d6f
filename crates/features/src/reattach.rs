//! Result reattachment.
//!
//! Calculators emit `(identity, value)` pairs in whatever order their sorted
//! views and workers produce them. The reattacher puts them back into the
//! store's original order and refuses to produce a series unless every
//! identity is accounted for exactly once.

use crate::series::FeatureSeries;
use fraud_core::{Error, RecordId, RecordStore, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps record identities back to store positions.
#[derive(Debug, Clone)]
pub struct Reattacher {
    ids: Arc<Vec<RecordId>>,
    index: Arc<HashMap<RecordId, usize>>,
}

impl Reattacher {
    /// Index the identities of a store.
    pub fn new(store: &RecordStore) -> Self {
        let ids: Vec<RecordId> = store.ids().collect();
        let index = ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();
        Self {
            ids: Arc::new(ids),
            index: Arc::new(index),
        }
    }

    /// Number of identities.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no identities.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Align pairs to store order.
    ///
    /// Fails with a data integrity error if an identity is unknown,
    /// duplicated, or missing.
    pub fn reattach<T, I>(&self, name: impl Into<String>, pairs: I) -> Result<FeatureSeries<T>>
    where
        I: IntoIterator<Item = (RecordId, T)>,
    {
        let name = name.into();
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(self.ids.len()).collect();

        for (id, value) in pairs {
            let pos = *self.index.get(&id).ok_or_else(|| {
                Error::data_integrity(format!("'{name}': record {id} is not in the store"))
            })?;
            if slots[pos].replace(value).is_some() {
                return Err(Error::data_integrity(format!(
                    "'{name}': record {id} was produced more than once"
                )));
            }
        }

        let missing = slots.iter().filter(|s| s.is_none()).count();
        if missing > 0 {
            let first = slots
                .iter()
                .position(Option::is_none)
                .map(|pos| self.ids[pos].to_string())
                .unwrap_or_default();
            return Err(Error::data_integrity(format!(
                "'{name}': {missing} record(s) have no value, first is {first}"
            )));
        }

        let values = slots.into_iter().flatten().collect();
        Ok(FeatureSeries::from_parts(
            name,
            Arc::clone(&self.ids),
            Arc::clone(&self.index),
            values,
        ))
    }

    /// Wrap values already in store order.
    pub fn aligned<T>(&self, name: impl Into<String>, values: Vec<T>) -> Result<FeatureSeries<T>> {
        if values.len() != self.ids.len() {
            return Err(Error::data_integrity(format!(
                "{} aligned values for {} records",
                values.len(),
                self.ids.len()
            )));
        }
        self.reattach(name, self.ids.iter().copied().zip(values))
    }
}
