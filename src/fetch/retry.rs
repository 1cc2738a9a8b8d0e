//! Bounded retry policy.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::{ExponentialBackoff, FixedInterval};

use crate::config::{
    RETRY_AFTER_CAP, RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_SECS,
};
use crate::error_handling::SourceError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    /// `base`, `2 * base`, `4 * base`, … capped at `max`.
    Exponential { base: Duration, max: Duration },
    /// The same delay before every retry.
    Fixed(Duration),
}

/// How many times an idempotent read is attempted and how long to wait
/// between attempts.
///
/// Each adapter call runs its own loop over its own schedule, so a 429 seen by
/// one source never slows down another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryPolicy {
    /// 3 attempts, doubling from 1s, capped at 15s.
    pub fn standard() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
                max: Duration::from_secs(RETRY_MAX_DELAY_SECS),
            },
        }
    }

    /// Fixed step between attempts.
    pub fn fixed(max_attempts: usize, step: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(step),
        }
    }

    /// A single attempt.
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Delays before the 2nd, 3rd, … attempts.
    pub fn delays(&self) -> Vec<Duration> {
        let retries = self.max_attempts.saturating_sub(1);
        match self.backoff {
            Backoff::Exponential { base, max } => {
                // from_millis(2) yields 2, 4, 8, ... scaled by `factor`
                let factor = (base.as_millis() as u64 / 2).max(1);
                ExponentialBackoff::from_millis(2)
                    .factor(factor)
                    .max_delay(max)
                    .take(retries)
                    .collect()
            }
            Backoff::Fixed(step) => FixedInterval::new(step).take(retries).collect(),
        }
    }

    /// Runs `operation` until it succeeds, fails with a non-retriable error,
    /// or the attempts run out.
    ///
    /// A `Retry-After` hint on a 429 stretches the scheduled delay (never
    /// shortens it), capped at [`RETRY_AFTER_CAP`].
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut delays = self.delays().into_iter();
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retriable() => {
                    let Some(scheduled) = delays.next() else {
                        log::warn!("{label}: giving up after {attempt} attempt(s): {error}");
                        return Err(error);
                    };
                    let delay = match error.retry_after() {
                        Some(hint) => scheduled.max(hint.min(RETRY_AFTER_CAP)),
                        None => scheduled,
                    };
                    log::warn!(
                        "{label}: attempt {attempt} failed ({error}), retrying in {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
