//! N-th transaction interval.
//!
//! Seconds spanned by a record and the record `n - 1` positions before it in
//! global time order, i.e. the time it took for the last `n` transactions to
//! happen. Records with fewer than `n - 1` predecessors get `0.0`.

use crate::executor::Executor;
use crate::ordering::normalize_by_time;
use crate::partition::partition_by_index;
use crate::reattach::Reattacher;
use crate::series::FeatureSeries;
use fraud_core::{span_seconds, Error, RecordStore, Result};
use tracing::debug;

/// Interval covered by every `n` consecutive transactions.
#[derive(Debug, Clone)]
pub struct NthInterval {
    time_field: String,
    n: usize,
}

impl NthInterval {
    /// Create a calculator. `n` must be at least 1.
    pub fn new(time_field: impl Into<String>, n: usize) -> Result<Self> {
        if n < 1 {
            return Err(Error::validation(format!("n must be at least 1, got {n}")));
        }
        Ok(Self {
            time_field: time_field.into(),
            n,
        })
    }

    /// Window size.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Compute intervals in seconds.
    ///
    /// Records with a missing timestamp get `None`. They sort after every
    /// present timestamp, so they are never used as a lookback source.
    pub fn compute(
        &self,
        store: &RecordStore,
        executor: &Executor,
    ) -> Result<FeatureSeries<Option<f64>>> {
        let view = normalize_by_time(store, &self.time_field, &[])?;
        let lag = self.n - 1;
        let partitions = partition_by_index(view.len(), executor.workers(), lag);
        debug!(
            records = view.len(),
            n = self.n,
            partitions = partitions.len(),
            "computing n-th transaction intervals"
        );

        let entries = view.entries();
        let chunks = executor.run(&partitions, |p| {
            let span = p.span();
            let local = &entries[span.clone()];
            let out = (p.lookback..local.len())
                .map(|i| {
                    let global = span.start + i;
                    let entry = &local[i];
                    let value = entry.ts.and_then(|ts| {
                        if global < lag {
                            Some(0.0)
                        } else {
                            local[i - lag].ts.map(|earlier| span_seconds(ts, earlier))
                        }
                    });
                    (entry.id, value)
                })
                .collect::<Vec<_>>();
            Ok(out)
        })?;

        Reattacher::new(store).reattach(
            format!("{}th_interval", self.n),
            chunks.into_iter().flatten(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraud_core::{FieldValue, Record, RecordId, NANOS_PER_SECOND};

    fn store(rows: &[(u64, Option<i64>)]) -> RecordStore {
        RecordStore::new(
            vec!["created".into()],
            rows.iter()
                .map(|(id, secs)| {
                    Record::new(
                        *id,
                        vec![secs
                            .map(|s| FieldValue::Timestamp(s * NANOS_PER_SECOND))
                            .unwrap_or(FieldValue::Null)],
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_third_transaction() {
        let s = store(&[(0, Some(0)), (1, Some(5)), (2, Some(9)), (3, Some(20)), (4, Some(30))]);
        let out = NthInterval::new("created", 3)
            .unwrap()
            .compute(&s, &Executor::sequential())
            .unwrap();
        assert_eq!(
            out.values(),
            &[Some(0.0), Some(0.0), Some(9.0), Some(15.0), Some(21.0)]
        );
    }

    #[test]
    fn test_n_equals_one() {
        let s = store(&[(0, Some(3)), (1, Some(1)), (2, Some(8))]);
        let out = NthInterval::new("created", 1)
            .unwrap()
            .compute(&s, &Executor::new(2))
            .unwrap();
        assert_eq!(out.values(), &[Some(0.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_invalid_n() {
        assert!(matches!(NthInterval::new("created", 0), Err(Error::Validation(_))));
    }

    #[test]
    fn test_unsorted_input_and_missing() {
        let s = store(&[(10, Some(30)), (11, None), (12, Some(0)), (13, Some(20)), (14, Some(5))]);
        let out = NthInterval::new("created", 2)
            .unwrap()
            .compute(&s, &Executor::sequential())
            .unwrap();
        // Time order: 12@0, 14@5, 13@20, 10@30, then 11 (missing)
        assert_eq!(out.get(RecordId(12)), Some(&Some(0.0)));
        assert_eq!(out.get(RecordId(14)), Some(&Some(5.0)));
        assert_eq!(out.get(RecordId(13)), Some(&Some(15.0)));
        assert_eq!(out.get(RecordId(10)), Some(&Some(10.0)));
        assert_eq!(out.get(RecordId(11)), Some(&None));
    }

    #[test]
    fn test_partitioning_matches_sequential() {
        let rows: Vec<(u64, Option<i64>)> = (0..40)
            .map(|i| (i, if i % 9 == 4 { None } else { Some((i as i64 * 13) % 50) }))
            .collect();
        let s = store(&rows);
        for n in [1, 2, 3, 7] {
            let calc = NthInterval::new("created", n).unwrap();
            let reference = calc.compute(&s, &Executor::sequential()).unwrap();
            for workers in 2..12 {
                let out = calc.compute(&s, &Executor::new(workers)).unwrap();
                assert_eq!(out, reference, "n {n}, workers {workers}");
            }
        }
    }

    #[test]
    fn test_centuries_apart() {
        let secs = |year| {
            chrono::NaiveDate::from_ymd_opt(year, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp()
        };
        let (early, late) = (secs(1700), secs(2200));
        let s = store(&[(0, Some(late)), (1, Some(early))]);
        let out = NthInterval::new("created", 2)
            .unwrap()
            .compute(&s, &Executor::new(2))
            .unwrap();
        assert_eq!(out.get(RecordId(1)), Some(&Some(0.0)));
        assert_eq!(out.get(RecordId(0)), Some(&Some((late - early) as f64)));
    }

    #[test]
    fn test_fewer_records_than_n() {
        let s = store(&[(0, Some(1)), (1, Some(2))]);
        let out = NthInterval::new("created", 5)
            .unwrap()
            .compute(&s, &Executor::sequential())
            .unwrap();
        assert_eq!(out.values(), &[Some(0.0), Some(0.0)]);
    }
}
