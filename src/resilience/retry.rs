use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::TokenError;

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Retry settings shared by every operation that uses the governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// retries allowed after the first attempt
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Fresh per-invocation state.
    pub fn start(&self) -> RetryState {
        RetryState {
            attempt: 0,
            max_attempts: self.max_attempts,
            base_delay: self.delay,
        }
    }

    /// Run `operation`, re-issuing it after the governor's delay while it keeps
    /// failing with a retryable status. The last failure is returned as-is.
    pub async fn run_with_retry<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError,
    {
        let mut state = self.start();

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(status) = err.status_code() else {
                return Err(err);
            };

            match should_retry(status, &state) {
                Decision::Retry { delay } => {
                    state.advance();
                    warn!(
                        "retrying in {}s after status {} (retry {}/{})",
                        delay.as_secs_f64(),
                        status,
                        state.attempt,
                        state.max_attempts
                    );
                    sleep(delay).await;
                }
                Decision::Exhausted => {
                    error!("giving up after {} attempts: {}", state.attempt.saturating_add(1), err);
                    return Err(err);
                }
                Decision::NonRetryable => return Err(err),
            }
        }
    }
}

/// Retry bookkeeping owned by a single logical operation, never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// retries already performed
    pub attempt: u32,
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryState {
    fn advance(&mut self) {
        self.attempt += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    /// retryable status, but the cap is reached
    Exhausted,
    NonRetryable,
}

impl Decision {
    pub fn retry(&self) -> bool {
        matches!(self, Decision::Retry { .. })
    }

    pub fn delay(&self) -> Duration {
        match self {
            Decision::Retry { delay } => *delay,
            Decision::Exhausted | Decision::NonRetryable => Duration::ZERO,
        }
    }
}

/// Decide what to do after an attempt failed with `status_code`.
///
/// Only 429 is retried, and only while `attempt < max_attempts`.
pub fn should_retry(status_code: u16, state: &RetryState) -> Decision {
    if status_code != STATUS_TOO_MANY_REQUESTS {
        return Decision::NonRetryable;
    }
    if state.attempt < state.max_attempts {
        Decision::Retry {
            delay: state.base_delay,
        }
    } else {
        Decision::Exhausted
    }
}

/// Failures that may carry the HTTP status the governor decides on.
pub trait RetryableError: std::fmt::Display {
    fn status_code(&self) -> Option<u16>;
}

impl RetryableError for TokenError {
    fn status_code(&self) -> Option<u16> {
        self.status()
    }
}
