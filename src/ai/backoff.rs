//! Backoff Policy
//!
//! Retry delay and retry/stop decisions for model calls.
//!
//! - Delay before retry `n` is `base_delay * 2^n` plus a random jitter in
//!   `[0, max_jitter)`.
//! - Only rate-limit failures are retried, and only while attempts remain.
//!   Everything else fails fast.

use std::time::Duration;

use rand::Rng;

use crate::constants::retry as retry_constants;
use crate::types::ErrorCategory;

/// Bounded exponential backoff with jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total attempts per invocation, first call included
    pub max_attempts: u32,
    /// Delay before the first retry (before jitter)
    pub base_delay: Duration,
    /// Exclusive upper bound of the random jitter
    pub max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_jitter: Duration::from_millis(retry_constants::MAX_JITTER_MS),
        }
    }
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Jitter bound, capped at one second
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter.min(Duration::from_millis(retry_constants::MAX_JITTER_MS));
        self
    }

    /// Delay to sleep after failed attempt `attempt` (0-based)
    pub fn next_delay(&self, attempt: u32) -> Duration {
        exponential_delay(attempt, self.base_delay).saturating_add(random_jitter(self.max_jitter))
    }

    pub fn should_retry(&self, attempt: u32, category: ErrorCategory) -> bool {
        should_retry(attempt, self.max_attempts, category)
    }
}

/// `base_delay * 2^attempt + jitter`, jitter in `[0, 1s)`
pub fn next_delay(attempt: u32, base_delay: Duration) -> Duration {
    BackoffPolicy::new(retry_constants::DEFAULT_MAX_ATTEMPTS, base_delay).next_delay(attempt)
}

/// True iff another attempt remains and the failure was a rate limit
pub fn should_retry(attempt: u32, max_attempts: u32, category: ErrorCategory) -> bool {
    attempt.saturating_add(1) < max_attempts && category.is_retryable()
}

/// Deterministic part of the delay: `base_delay * 2^attempt`, saturating
pub fn exponential_delay(attempt: u32, base_delay: Duration) -> Duration {
    if base_delay.is_zero() {
        return Duration::ZERO;
    }
    match 1u32.checked_shl(attempt) {
        Some(factor) => base_delay.saturating_mul(factor),
        None => Duration::MAX,
    }
}

/// Uniform jitter in `[0, max)` at millisecond resolution
fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}
