//! Bounded retry and per-call timeouts for collaborator calls.

use std::future::Future;
use std::time::Duration;

/// How many times a collaborator call may be attempted, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Never less than 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay to wait before `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(16);
        self.backoff.saturating_mul(1 << exponent)
    }

    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Sleeps for the backoff owed before `attempt`.
    pub async fn wait_before(&self, attempt: u32) {
        let delay = self.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Error returned when a collaborator call outlives its deadline.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("call timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Runs `fut` under `limit`; the future is dropped (cancelled) when the deadline passes.
pub async fn with_timeout<F: Future>(limit: Duration, fut: F) -> Result<F::Output, TimedOut> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| TimedOut(limit))
}
