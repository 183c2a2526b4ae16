//! Bounded fan-out / fan-in over independent work items.
//!
//! Work runs on a dedicated rayon pool so each invocation controls its own
//! worker count instead of sharing the global pool. Items never observe each
//! other's results: every closure gets one item and returns one value, and
//! the caller folds the returned values on its own thread.
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use tracing::debug;

use crate::config::default_thread_count;
use crate::errors::{ScoutError, ScoutResult};

/// Items handed to the pool per batch, per worker, by `map_batches`
const ITEMS_PER_WORKER: usize = 32;

#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
}

impl WorkerPool {
    pub fn new(threads: NonZeroUsize) -> ScoutResult<Self> {
        let threads = threads.get();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("scout-worker-{}", i))
            .build()
            .map_err(|e| ScoutError::config_error(format!("Failed to start worker pool: {}", e)))?;
        debug!("Worker pool started with {} threads", threads);
        Ok(Self { pool, threads })
    }

    /// Pool sized to the available hardware parallelism
    pub fn with_default_threads() -> ScoutResult<Self> {
        Self::new(default_thread_count())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs `f` once per item and returns every result.
    ///
    /// Results come back in input order regardless of which worker finished
    /// first, so aggregation over them is reproducible.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(|item| f(item)).collect())
    }

    /// Processes items in consecutive parallel batches, handing each batch's
    /// results to `aggregate`. Returning `false` from `aggregate` stops the
    /// run before the next batch is dispatched.
    pub fn map_batches<T, R, F, A>(&self, items: &[T], f: F, mut aggregate: A)
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
        A: FnMut(Vec<R>) -> bool,
    {
        let batch_size = self.threads * ITEMS_PER_WORKER;
        for batch in items.chunks(batch_size.max(1)) {
            let results = self.map(batch, &f);
            if !aggregate(results) {
                debug!("Aggregator stopped the run early");
                break;
            }
        }
    }
}
