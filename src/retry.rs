//! Retry policies and the retry driver
//!
//! The driver owns all retry state. Each attempt receives a [`RetryContext`]
//! and answers with a [`RetrySignal`] on failure: `Retry` schedules a
//! backoff, `Bail` aborts immediately and surfaces the error unchanged.

use crate::error::{RunnerError, RunnerResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier (e.g. 2.0 for exponential)
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
    /// Whether backoff grows exponentially
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential: true,
        }
    }
}

impl RetryPolicy {
    /// Policy with a fixed backoff and no jitter.
    pub fn fixed(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff: backoff,
            max_backoff: backoff,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
            exponential: false,
        }
    }

    /// Policy with exponential backoff between `initial` and `max`.
    pub fn exponential(max_retries: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff: initial,
            max_backoff: max,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential: true,
        }
    }

    /// Whether another retry fits inside the budget.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Backoff before the given attempt. Attempt 0 is the first try and
    /// has no backoff.
    pub fn next_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = if self.exponential {
            let multiplier = self.backoff_multiplier.powf((attempt - 1) as f64);
            if multiplier.is_finite() && multiplier < 1e6 {
                Duration::from_secs_f64(self.initial_backoff.as_secs_f64() * multiplier)
            } else {
                self.max_backoff
            }
        } else {
            self.initial_backoff
        };

        let capped = base.min(self.max_backoff);
        let jitter = capped.as_secs_f64() * self.jitter_factor * rand::random::<f64>();
        Duration::from_secs_f64(capped.as_secs_f64() + jitter)
    }
}

/// State handed to each retried attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryContext {
    /// Zero-based attempt counter
    pub attempt: u32,
    /// Time elapsed since the first attempt started
    pub elapsed: Duration,
}

/// Failure signal returned by a retried operation.
#[derive(Debug)]
pub enum RetrySignal {
    /// Transient failure, schedule a backoff and try again
    Retry(RunnerError),
    /// Unrecoverable failure, abort retrying and surface the error
    Bail(RunnerError),
}

/// Drives an operation through a [`RetryPolicy`].
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create an executor for the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `operation` until it succeeds, bails, or exhausts the retry
    /// budget. The last error is returned on exhaustion.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> RunnerResult<T>
    where
        F: FnMut(RetryContext) -> Fut,
        Fut: Future<Output = Result<T, RetrySignal>>,
    {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            let context = RetryContext {
                attempt,
                elapsed: started.elapsed(),
            };

            match operation(context).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(RetrySignal::Bail(error)) => {
                    warn!(attempt = attempt + 1, %error, "operation bailed");
                    return Err(error);
                }
                Err(RetrySignal::Retry(error)) => {
                    if !self.policy.should_retry(attempt) {
                        warn!(attempts = attempt + 1, %error, "retry budget exhausted");
                        return Err(error);
                    }

                    attempt += 1;
                    let backoff = self.policy.next_backoff(attempt);
                    warn!(attempt, backoff_ms = backoff.as_millis() as u64, %error, "operation failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
