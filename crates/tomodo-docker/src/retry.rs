//! Bounded retry with a fixed delay around any fallible async operation

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Raised when every attempt failed and no error was captured to re-raise
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed after {attempts} attempts")]
pub struct RetryExhausted {
    pub operation: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// Return `Ok(None)` instead of an error once attempts run out
    pub ignore_on_exhaustion: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
            ignore_on_exhaustion: false,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            ignore_on_exhaustion: false,
        }
    }

    pub fn ignoring_exhaustion(mut self) -> Self {
        self.ignore_on_exhaustion = true;
        self
    }

    /// Run `op` until it succeeds or `max_attempts` attempts have failed.
    ///
    /// Only errors for which `is_retryable` returns true consume an attempt;
    /// any other error is returned immediately. After exhaustion the last
    /// error is returned, or [`RetryExhausted`] when none was captured,
    /// unless the policy ignores exhaustion.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        operation: &str,
        is_retryable: P,
        mut op: F,
    ) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: fmt::Display + From<RetryExhausted>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(Some(value)),
                Err(e) if is_retryable(&e) => {
                    info!("{}: Attempt {}/{} ({})", operation, attempt, self.max_attempts, e);
                    last_error = Some(e);
                    if attempt < self.max_attempts && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        error!("{} failed after {} attempts", operation, self.max_attempts);
        if self.ignore_on_exhaustion {
            return Ok(None);
        }
        Err(last_error.unwrap_or_else(|| {
            RetryExhausted {
                operation: operation.to_owned(),
                attempts: self.max_attempts,
            }
            .into()
        }))
    }
}
