//! Bounded retry with exponential backoff

use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::Result;

/// How often and how patiently a request is repeated
///
/// Only errors for which [`ClientError::is_retryable`] holds are retried.
///
/// [`ClientError::is_retryable`]: crate::ClientError::is_retryable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Upper bound for the doubling delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// A policy that gives up after the first failure
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails terminally, or runs out of
    /// attempts
    ///
    /// # Arguments
    /// * `what` - Short description used in log lines
    /// * `operation` - Produces a fresh request future for every attempt
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{} succeeded after {} attempt(s)", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => {
                    error!("{} failed with a non-retryable error: {}", what, e);
                    return Err(e);
                }
                Err(e) => {
                    if attempt >= self.max_attempts {
                        error!("{} failed after {} attempts: {}", what, attempt, e);
                        return Err(e);
                    }

                    let delay = self.delay_after(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what, attempt, self.max_attempts, e, delay
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(7, Duration::from_secs(1), Duration::from_secs(30))
    }
}
