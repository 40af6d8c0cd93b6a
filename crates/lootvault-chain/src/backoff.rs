//! Retry backoff policy and the sleep abstraction.
//!
//! The policy is a plain value passed into the verifier, so the schedule
//! is testable without real time; sleeps flow through the [`Sleeper`]
//! trait for the same reason.

use std::time::Duration;

use async_trait::async_trait;

/// Exponential backoff: delay doubles each attempt, capped per attempt,
/// with a bounded total attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total lookup attempts before giving up.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub base_delay: Duration,

    /// Per-attempt delay cap.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
        }
    }
}

impl BackoffPolicy {
    /// Delay after the given zero-based attempt:
    /// `min(base_delay * 2^attempt, max_delay)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Upper bound on the total time spent sleeping across a full run.
    /// The final attempt is not followed by a sleep.
    #[must_use]
    pub fn total_delay_bound(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for(attempt))
            .sum()
    }
}

/// An injectable sleep, so retry schedules are testable without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// The real sleeper, backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
