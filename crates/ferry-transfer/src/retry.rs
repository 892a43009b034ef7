//! Bounded fixed-delay retries around a per-object attempt.

use std::future::Future;
use std::time::Duration;

use crate::TRACING_TARGET;
use crate::error::{Result, TransferError};

/// Retries an attempt while it fails with a retryable error.
///
/// A non-retryable error on the first attempt is returned as is; on a later
/// attempt it is wrapped in [`TransferError::Fatal`] with the attempt count.
/// When every attempt fails retryably the last error is wrapped in
/// [`TransferError::Exhausted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy making at most `max_attempts` attempts (at least one).
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `attempt` (given the 1-based attempt number) for `key`.
    pub async fn run<T, F, Fut>(&self, key: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut number = 1;
        loop {
            let error = match attempt(number).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_retryable() {
                if number == 1 {
                    return Err(error);
                }
                return Err(TransferError::Fatal {
                    key: key.to_owned(),
                    attempts: number,
                    last: Box::new(error),
                });
            }
            if number >= self.max_attempts {
                return Err(TransferError::Exhausted {
                    key: key.to_owned(),
                    attempts: number,
                    last: Box::new(error),
                });
            }

            tracing::warn!(
                target: TRACING_TARGET,
                key,
                attempt = number,
                max_attempts = self.max_attempts,
                delay_ms = self.delay.as_millis() as u64,
                error = %error,
                "Attempt failed, retrying"
            );
            tokio::time::sleep(self.delay).await;
            number += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}
