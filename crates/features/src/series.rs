//! Derived feature series.

use fraud_core::{FieldValue, RecordId};
use std::collections::HashMap;
use std::sync::Arc;

/// Derived values aligned to a record store's original order.
///
/// Built only through [`crate::reattach::Reattacher`], so every store
/// identity appears exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSeries<T> {
    name: String,
    ids: Arc<Vec<RecordId>>,
    index: Arc<HashMap<RecordId, usize>>,
    values: Vec<T>,
}

impl<T> FeatureSeries<T> {
    pub(crate) fn from_parts(
        name: String,
        ids: Arc<Vec<RecordId>>,
        index: Arc<HashMap<RecordId, usize>>,
        values: Vec<T>,
    ) -> Self {
        debug_assert_eq!(ids.len(), values.len());
        Self {
            name,
            ids,
            index,
            values,
        }
    }

    /// Series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in store order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Identities in store order.
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Value of a record.
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.index.get(&id).map(|&pos| &self.values[pos])
    }

    /// Iterate (identity, value) pairs in store order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &T)> + '_ {
        self.ids.iter().copied().zip(self.values.iter())
    }

    /// Consume the series, returning values in store order.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Rename the series.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Transform each value, keeping alignment.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> FeatureSeries<U> {
        FeatureSeries {
            name: self.name,
            ids: self.ids,
            index: self.index,
            values: self.values.into_iter().map(f).collect(),
        }
    }
}

impl<T> FeatureSeries<Option<T>> {
    /// Replace missing values with `fill`.
    pub fn fill_missing(self, fill: T) -> FeatureSeries<T>
    where
        T: Clone,
    {
        self.map(|v| v.unwrap_or_else(|| fill.clone()))
    }

    /// Number of missing values.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

impl<T: Clone + Into<FieldValue>> FeatureSeries<T> {
    /// Values as store field values, for joining back as a column.
    pub fn to_field_values(&self) -> Vec<FieldValue> {
        self.values.iter().cloned().map(Into::into).collect()
    }
}

/// A computed feature column of any supported value type.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureColumn {
    /// Durations in seconds.
    Seconds(FeatureSeries<Option<f64>>),
    /// Counts and calendar components.
    Integer(FeatureSeries<Option<u32>>),
    /// Dimensionless ratios.
    Ratio(FeatureSeries<f64>),
    /// Text values.
    Text(FeatureSeries<Option<String>>),
}

impl FeatureColumn {
    /// Column name.
    pub fn name(&self) -> &str {
        match self {
            FeatureColumn::Seconds(s) => s.name(),
            FeatureColumn::Integer(s) => s.name(),
            FeatureColumn::Ratio(s) => s.name(),
            FeatureColumn::Text(s) => s.name(),
        }
    }

    /// Rename the column.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        match self {
            FeatureColumn::Seconds(s) => FeatureColumn::Seconds(s.with_name(name)),
            FeatureColumn::Integer(s) => FeatureColumn::Integer(s.with_name(name)),
            FeatureColumn::Ratio(s) => FeatureColumn::Ratio(s.with_name(name)),
            FeatureColumn::Text(s) => FeatureColumn::Text(s.with_name(name)),
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            FeatureColumn::Seconds(s) => s.len(),
            FeatureColumn::Integer(s) => s.len(),
            FeatureColumn::Ratio(s) => s.len(),
            FeatureColumn::Text(s) => s.len(),
        }
    }

    /// Whether the column is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identities in store order.
    pub fn ids(&self) -> &[RecordId] {
        match self {
            FeatureColumn::Seconds(s) => s.ids(),
            FeatureColumn::Integer(s) => s.ids(),
            FeatureColumn::Ratio(s) => s.ids(),
            FeatureColumn::Text(s) => s.ids(),
        }
    }

    /// Values as store field values.
    pub fn to_field_values(&self) -> Vec<FieldValue> {
        match self {
            FeatureColumn::Seconds(s) => s.to_field_values(),
            FeatureColumn::Integer(s) => s.to_field_values(),
            FeatureColumn::Ratio(s) => s.to_field_values(),
            FeatureColumn::Text(s) => s.to_field_values(),
        }
    }
}

impl From<FeatureSeries<Option<f64>>> for FeatureColumn {
    fn from(s: FeatureSeries<Option<f64>>) -> Self {
        FeatureColumn::Seconds(s)
    }
}

impl From<FeatureSeries<Option<u32>>> for FeatureColumn {
    fn from(s: FeatureSeries<Option<u32>>) -> Self {
        FeatureColumn::Integer(s)
    }
}

impl From<FeatureSeries<f64>> for FeatureColumn {
    fn from(s: FeatureSeries<f64>) -> Self {
        FeatureColumn::Ratio(s)
    }
}

impl From<FeatureSeries<Option<String>>> for FeatureColumn {
    fn from(s: FeatureSeries<Option<String>>) -> Self {
        FeatureColumn::Text(s)
    }
}
