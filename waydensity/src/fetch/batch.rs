//! Bounded batch fan-out.
//!
//! Units are started in chunks of `batch_size`. Every future in a chunk runs
//! concurrently; the coordinator waits for the whole chunk, hands each result
//! to the merge callback in unit order, then pauses before the next chunk.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default number of units started together.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default pause between batches (1 second).
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 1_000;

/// Batch sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Units per batch (minimum 1).
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub pause: Duration,
}

impl BatchConfig {
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, Duration::from_millis(DEFAULT_BATCH_PAUSE_MS))
    }
}

/// The run was cancelled before every batch completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("batch run cancelled")]
pub struct BatchCancelled;

/// Runs `work` over `items` in bounded batches.
///
/// `merge` is called sequentially after each batch completes, once per item
/// and in item order. Returns [`BatchCancelled`] if `cancel` fires; results of
/// a batch that completed before the cancellation are still merged.
pub async fn run_batched<'a, T, R, W, Fut, M>(
    items: &'a [T],
    config: &BatchConfig,
    cancel: &CancellationToken,
    work: W,
    mut merge: M,
) -> Result<(), BatchCancelled>
where
    W: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
    M: FnMut(&'a T, R),
{
    let batch_size = config.batch_size.max(1);
    let total = items.len().div_ceil(batch_size);

    for (number, chunk) in items.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            return Err(BatchCancelled);
        }
        if number > 0 && !config.pause.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BatchCancelled),
                _ = tokio::time::sleep(config.pause) => {}
            }
        }

        debug!(batch = number + 1, of = total, units = chunk.len(), "Starting batch");
        let results = join_all(chunk.iter().map(&work)).await;

        for (item, result) in chunk.iter().zip(results) {
            merge(item, result);
        }
    }

    if cancel.is_cancelled() {
        return Err(BatchCancelled);
    }
    Ok(())
}
