//! Trailing-window transaction counts.
//!
//! For each record, counts the records sharing its composite key whose
//! timestamp lies within `interval` before it, the record itself included.
//!
//! The sliding window evicts entries strictly older than
//! `current - interval`, so an entry exactly `interval` old still counts.
//! Among records with equal timestamps in one group, a record only sees the
//! ones ordered before it (store order breaks ties).
//!
//! Two execution strategies give identical results:
//! - [`WindowStrategy::ByGroup`]: the (key, time)-sorted view is split into
//!   partitions that never cut through a group, and each worker slides a
//!   window over its own groups. A window never needs entries from another
//!   group, so no partition boundary can lose window state.
//! - [`WindowStrategy::Sequential`]: one pass over the globally time-sorted
//!   view with a single buffer holding all groups' entries. Eviction is by
//!   time only; key filtering happens when counting.

use crate::executor::{CancelFlag, Executor};
use crate::ordering::{group_ranges, normalize, normalize_by_time, OrderedEntry};
use crate::partition::partition_by_groups;
use crate::reattach::Reattacher;
use crate::series::FeatureSeries;
use fraud_core::config::{validate_interval_minutes, WindowStrategy};
use fraud_core::{GroupKey, RecordId, RecordStore, Result, TimestampNs};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Records processed between cancel checks in the sequential pass.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Sliding window over the timestamps of a single group.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    interval_ns: i64,
    buffer: VecDeque<TimestampNs>,
}

impl SlidingWindow {
    /// Create an empty window.
    pub fn new(interval_ns: i64) -> Self {
        Self {
            interval_ns,
            buffer: VecDeque::new(),
        }
    }

    /// Evict stale entries, add `ts`, and return the window size.
    ///
    /// Timestamps must be pushed in non-decreasing order.
    pub fn push(&mut self, ts: TimestampNs) -> u32 {
        let cutoff = ts.saturating_sub(self.interval_ns);
        while self.buffer.front().is_some_and(|&front| front < cutoff) {
            self.buffer.pop_front();
        }
        self.buffer.push_back(ts);
        self.buffer.len() as u32
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Sliding window over interleaved groups, counting per key.
#[derive(Debug)]
pub struct KeyedSlidingWindow<'a> {
    interval_ns: i64,
    buffer: VecDeque<(&'a GroupKey, TimestampNs)>,
    per_key: HashMap<&'a GroupKey, u32>,
}

impl<'a> KeyedSlidingWindow<'a> {
    /// Create an empty window.
    pub fn new(interval_ns: i64) -> Self {
        Self {
            interval_ns,
            buffer: VecDeque::new(),
            per_key: HashMap::new(),
        }
    }

    /// Evict stale entries of any key, add `(key, ts)`, and return the number
    /// of buffered entries with that key.
    ///
    /// Timestamps must be pushed in non-decreasing order.
    pub fn push(&mut self, key: &'a GroupKey, ts: TimestampNs) -> u32 {
        let cutoff = ts.saturating_sub(self.interval_ns);
        while let Some(&(old_key, old_ts)) = self.buffer.front() {
            if old_ts >= cutoff {
                break;
            }
            self.buffer.pop_front();
            if let Some(n) = self.per_key.get_mut(old_key) {
                *n -= 1;
                if *n == 0 {
                    self.per_key.remove(old_key);
                }
            }
        }
        self.buffer.push_back((key, ts));
        let n = self.per_key.entry(key).or_insert(0);
        *n += 1;
        *n
    }

    /// Total buffered entries across keys.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Counts records per composite key within a trailing interval.
#[derive(Debug, Clone)]
pub struct WindowCounter {
    time_field: String,
    key_fields: Vec<String>,
    interval_ns: i64,
    strategy: WindowStrategy,
}

impl WindowCounter {
    /// Create a counter.
    ///
    /// Fails if `interval_minutes` is not a positive, finite number.
    pub fn new(
        time_field: impl Into<String>,
        key_fields: Vec<String>,
        interval_minutes: f64,
        strategy: WindowStrategy,
    ) -> Result<Self> {
        Ok(Self {
            time_field: time_field.into(),
            key_fields,
            interval_ns: validate_interval_minutes(interval_minutes)?,
            strategy,
        })
    }

    /// Interval length in nanoseconds.
    pub fn interval_ns(&self) -> i64 {
        self.interval_ns
    }

    /// Execution strategy.
    pub fn strategy(&self) -> WindowStrategy {
        self.strategy
    }

    /// Count with one partition per executor worker.
    pub fn count(&self, store: &RecordStore, executor: &Executor) -> Result<FeatureSeries<Option<u32>>> {
        self.count_partitioned(store, executor, executor.workers())
    }

    /// Count, splitting the by-group strategy into at most `partitions`
    /// partitions. The result doesn't depend on `partitions`.
    pub fn count_partitioned(
        &self,
        store: &RecordStore,
        executor: &Executor,
        partitions: usize,
    ) -> Result<FeatureSeries<Option<u32>>> {
        let pairs = match self.strategy {
            WindowStrategy::ByGroup => self.count_by_group(store, executor, partitions)?,
            WindowStrategy::Sequential => self.count_sequential(store, executor.cancel_flag())?,
        };
        Reattacher::new(store).reattach(self.default_name(), pairs)
    }

    fn default_name(&self) -> String {
        format!("{}_count", self.key_fields.join("_"))
    }

    fn count_by_group(
        &self,
        store: &RecordStore,
        executor: &Executor,
        partitions: usize,
    ) -> Result<Vec<(RecordId, Option<u32>)>> {
        let view = normalize(store, &self.time_field, &self.key_fields)?;
        let groups = view.group_ranges();
        let parts = partition_by_groups(&groups, partitions);
        debug!(
            groups = groups.len(),
            partitions = parts.len(),
            interval_ns = self.interval_ns,
            "counting trailing windows by group"
        );

        let entries = view.entries();
        let chunks = executor.run(&parts, |p| {
            let slice = &entries[p.interior.clone()];
            let mut out = Vec::with_capacity(slice.len());
            let mut window = SlidingWindow::new(self.interval_ns);
            for range in group_ranges(slice) {
                window.clear();
                count_group(&slice[range], &mut window, &mut out);
            }
            Ok(out)
        })?;

        Ok(chunks.into_iter().flatten().collect())
    }

    fn count_sequential(
        &self,
        store: &RecordStore,
        cancel: &CancelFlag,
    ) -> Result<Vec<(RecordId, Option<u32>)>> {
        let view = normalize_by_time(store, &self.time_field, &self.key_fields)?;
        debug!(
            records = view.len(),
            interval_ns = self.interval_ns,
            "counting trailing windows in one pass"
        );

        let mut window = KeyedSlidingWindow::new(self.interval_ns);
        let mut out = Vec::with_capacity(view.len());
        for (i, entry) in view.entries().iter().enumerate() {
            if i % CANCEL_CHECK_INTERVAL == 0 {
                cancel.check()?;
            }
            let count = entry.ts.map(|ts| window.push(&entry.key, ts));
            out.push((entry.id, count));
        }
        Ok(out)
    }
}

/// Slide a fresh window over one time-sorted group.
fn count_group(
    group: &[OrderedEntry],
    window: &mut SlidingWindow,
    out: &mut Vec<(RecordId, Option<u32>)>,
) {
    for entry in group {
        out.push((entry.id, entry.ts.map(|ts| window.push(ts))));
    }
}
