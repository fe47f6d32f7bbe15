//! Exponential backoff with jitter for lock retries
//!
//! delay(attempt) = min(max_timeout, min_timeout * factor^attempt * r)
//! where r is drawn from [1, 2) when randomized and is 1 otherwise.

use std::time::Duration;

use rand::Rng;

use crate::config::LockOptions;

/// Retry schedule for lock acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Multiplier per attempt
    pub factor: f64,
    /// Delay before the first retry
    pub min_timeout: Duration,
    /// Ceiling for any single delay
    pub max_timeout: Duration,
    /// Spread waiters apart with a random factor
    pub randomize: bool,
}

impl RetryPolicy {
    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay to wait after failed attempt number `attempt` (0-based).
    pub fn delay<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        if self.min_timeout.is_zero() {
            return Duration::ZERO;
        }
        let jitter = if self.randomize {
            rng.gen_range(1.0..2.0)
        } else {
            1.0
        };

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.min_timeout.as_millis() as f64 * self.factor.powi(exponent) * jitter;
        let ceiling = self.max_timeout.as_millis() as f64;

        // powi overflows to infinity long before 500 attempts with factor 3
        if !millis.is_finite() || millis >= ceiling {
            return self.max_timeout;
        }
        Duration::from_millis(millis.round() as u64)
    }
}

impl From<&LockOptions> for RetryPolicy {
    fn from(options: &LockOptions) -> Self {
        Self {
            retries: options.retries,
            factor: options.factor,
            min_timeout: options.min_timeout(),
            max_timeout: options.max_timeout(),
            randomize: options.randomize,
        }
    }
}
