//! Parallel execution of partitions.
//!
//! Each invocation builds its own rayon pool, runs every partition to
//! completion and joins before returning. No pool outlives the call.

use fraud_core::config::ParallelConfig;
use fraud_core::{Error, Result};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Cooperative stop signal shared between a caller and running work.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with `Error::Cancelled` if cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs independent partitions on a scoped worker pool.
#[derive(Debug, Clone)]
pub struct Executor {
    /// Requested worker count (0 = auto).
    workers: usize,
    /// Checked before each partition starts.
    cancel: CancelFlag,
}

impl Executor {
    /// Create an executor with the given worker count (0 = auto).
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            cancel: CancelFlag::new(),
        }
    }

    /// Single-threaded executor.
    pub fn sequential() -> Self {
        Self::new(1)
    }

    /// Create an executor from configuration.
    pub fn from_config(config: &ParallelConfig) -> Self {
        Self::new(config.workers)
    }

    /// Share a cancel flag with the caller.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// The executor's cancel flag.
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Resolved worker count.
    pub fn workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.workers
        }
    }

    /// Run `work` on every partition and join.
    ///
    /// Results come back in partition order, but callers must not rely on
    /// it: values carry their record identity instead.
    pub fn run<P, R, F>(&self, partitions: &[P], work: F) -> Result<Vec<R>>
    where
        P: Sync,
        R: Send,
        F: Fn(&P) -> Result<R> + Sync,
    {
        let threads = self.workers().min(partitions.len());
        if threads <= 1 {
            return partitions
                .iter()
                .map(|p| {
                    self.cancel.check()?;
                    work(p)
                })
                .collect();
        }

        debug!(threads, partitions = partitions.len(), "running partitions");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::parallelism(e.to_string()))?;

        pool.install(|| {
            partitions
                .par_iter()
                .map(|p| {
                    self.cancel.check()?;
                    work(p)
                })
                .collect()
        })
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(0)
    }
}
