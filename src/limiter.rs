//! Bounded concurrent execution of per-partition batch tasks

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::{RunnerError, RunnerResult};

/// Admits at most `limit` tasks concurrently; the rest queue in FIFO
/// order behind the semaphore. A failed task releases its slot immediately
/// and its error propagates unchanged. `limit = 1` degenerates to strict
/// serial execution.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: AtomicUsize,
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting up to `limit` tasks, at least 1.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Run `task` once a slot is free. Completes with the task's value or
    /// error; waiting callers are admitted in the order they arrived.
    pub async fn run<T, F>(&self, task: F) -> RunnerResult<T>
    where
        F: std::future::Future<Output = RunnerResult<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RunnerError::Processing("concurrency limiter closed".to_string()))?;

        let count = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(in_flight = count, limit = self.limit, "batch task admitted");

        let result = task.await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Number of tasks currently executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Configured concurrency cap.
    pub fn limit(&self) -> usize {
        self.limit
    }
}
