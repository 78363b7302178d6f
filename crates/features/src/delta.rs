//! Grouped time deltas.
//!
//! Seconds elapsed since the previous record of the same group.

use crate::executor::Executor;
use crate::ordering::{group_ranges, normalize, OrderedEntry};
use crate::partition::partition_by_groups;
use crate::reattach::Reattacher;
use crate::series::FeatureSeries;
use fraud_core::{span_seconds, RecordId, RecordStore, Result};
use tracing::debug;

/// Per-group consecutive timestamp difference.
#[derive(Debug, Clone)]
pub struct GroupedDelta {
    time_field: String,
    group_field: String,
}

impl GroupedDelta {
    /// Create a delta calculator.
    pub fn new(time_field: impl Into<String>, group_field: impl Into<String>) -> Self {
        Self {
            time_field: time_field.into(),
            group_field: group_field.into(),
        }
    }

    /// Compute deltas in seconds.
    ///
    /// The first record of each group gets `None`, as does any record whose
    /// own or predecessor's timestamp is missing.
    pub fn compute(
        &self,
        store: &RecordStore,
        executor: &Executor,
    ) -> Result<FeatureSeries<Option<f64>>> {
        let view = normalize(store, &self.time_field, std::slice::from_ref(&self.group_field))?;
        let groups = view.group_ranges();
        let partitions = partition_by_groups(&groups, executor.workers());
        debug!(
            groups = groups.len(),
            partitions = partitions.len(),
            "computing grouped deltas"
        );

        let entries = view.entries();
        let chunks = executor.run(&partitions, |p| {
            let slice = &entries[p.interior.clone()];
            let mut out = Vec::with_capacity(slice.len());
            for range in group_ranges(slice) {
                group_deltas(&slice[range], &mut out);
            }
            Ok(out)
        })?;

        Reattacher::new(store).reattach(
            format!("{}_delta", self.group_field),
            chunks.into_iter().flatten(),
        )
    }
}

/// Deltas within one time-sorted group.
fn group_deltas(group: &[OrderedEntry], out: &mut Vec<(RecordId, Option<f64>)>) {
    let mut prev: Option<Option<i64>> = None;
    for entry in group {
        let delta = match (prev, entry.ts) {
            (Some(Some(p)), Some(t)) => Some(span_seconds(t, p)),
            _ => None,
        };
        out.push((entry.id, delta));
        prev = Some(entry.ts);
    }
}
