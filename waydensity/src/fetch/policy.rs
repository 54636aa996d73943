//! Retry policy for external fetches.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use waydensity::fetch::RetryPolicy;
//!
//! // 3 attempts: fail, wait 500ms, fail, wait 1s, fail, give up
//! let policy = RetryPolicy::exponential(3);
//! assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(500)));
//! assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(1000)));
//! assert_eq!(policy.delay_for_attempt(3), None);
//! ```

use std::time::Duration;

/// Default number of attempts per unit, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay after the first failure (500ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Default maximum delay between attempts (8 seconds).
pub const DEFAULT_MAX_DELAY_MS: u64 = 8_000;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Bounded retry with exponential backoff.
///
/// The delay doubles (by default) after each failed attempt, capped at
/// `max_delay`. Once `max_attempts` attempts have failed the unit is given up.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Exponential backoff starting at [`DEFAULT_INITIAL_DELAY_MS`].
    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the delay after the first failure.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay after a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt that just failed (1-based)
    ///
    /// # Returns
    ///
    /// The delay before the next attempt, or `None` if the budget is spent.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }

        // initial_delay * multiplier^(attempt-1), capped
        let factor = self.multiplier.powi((attempt - 1) as i32);
        let delay_ms = self.initial_delay.as_millis() as f64 * factor;
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Some(Duration::from_millis(capped as u64))
    }
}
