//! Fetch orchestration
//!
//! Retry policy and bounded batching for per-unit Overpass requests, plus
//! the counters a request accumulates while its units run.

mod batch;
mod policy;

pub use batch::{
    run_batched, BatchCancelled, BatchConfig, DEFAULT_BATCH_PAUSE_MS, DEFAULT_BATCH_SIZE,
};
pub use policy::{
    RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_MS,
};

use serde::Serialize;

use crate::overpass::{FetchError, Fetched};

/// Per-request fetch counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStats {
    /// Units planned.
    pub units: usize,
    /// Units that returned data.
    pub succeeded: usize,
    /// Units given up after the retry budget.
    pub failed: usize,
    /// Units abandoned because the request was cancelled.
    pub cancelled: usize,
    /// HTTP attempts across all finished units, failed ones included.
    pub attempts: u64,
    /// Ways received.
    pub ways: usize,
}

impl FetchStats {
    pub fn new(units: usize) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    /// Records one unit's outcome.
    pub fn record(&mut self, outcome: Result<&Fetched, &FetchError>) {
        match outcome {
            Ok(fetched) => {
                self.succeeded += 1;
                self.attempts += u64::from(fetched.attempts);
                self.ways += fetched.ways.len();
            }
            Err(FetchError::Exhausted { attempts, .. }) => {
                self.failed += 1;
                self.attempts += u64::from(*attempts);
            }
            Err(FetchError::Cancelled) => self.cancelled += 1,
        }
    }
}
