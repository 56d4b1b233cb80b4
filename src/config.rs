//! Runner configuration structures

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`Runner`](crate::runner::Runner).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Resolve the batch's last offset automatically after the batch
    /// handler returns. Disable to let the handler drive offset
    /// advancement, e.g. for cooperative shutdown mid-batch.
    pub each_batch_auto_resolve: bool,

    /// Permit periodic and post-cycle commits of resolved offsets
    pub auto_commit: bool,

    /// How many partitions may have their batches processed in parallel
    /// within one fetch cycle
    pub partitions_consumed_concurrently: usize,

    /// Minimum interval between heartbeats while consuming
    pub heartbeat_interval: Duration,

    /// Retry policy for join/sync and the fetch loop
    pub retry: RetryPolicy,

    /// Skip the 1-second consumer drain poll in `stop`. Injected by test
    /// harnesses to avoid leaking timers.
    pub test_mode: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            each_batch_auto_resolve: true,
            auto_commit: true,
            partitions_consumed_concurrently: 1,
            heartbeat_interval: Duration::from_secs(3),
            retry: RetryPolicy::default(),
            test_mode: false,
        }
    }
}

impl RunnerConfig {
    /// Create a config builder.
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::new()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.partitions_consumed_concurrently == 0 {
            return Err("partitions_consumed_concurrently must be at least 1".to_string());
        }

        if self.heartbeat_interval.is_zero() {
            return Err("heartbeat_interval must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Builder for [`RunnerConfig`]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    /// Create a builder seeded with defaults.
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
        }
    }

    /// Set whether the batch handler's last offset resolves automatically.
    pub fn each_batch_auto_resolve(mut self, enable: bool) -> Self {
        self.config.each_batch_auto_resolve = enable;
        self
    }

    /// Enable or disable automatic offset commits.
    pub fn auto_commit(mut self, enable: bool) -> Self {
        self.config.auto_commit = enable;
        self
    }

    /// Set the per-cycle partition processing concurrency.
    pub fn partitions_consumed_concurrently(mut self, limit: usize) -> Self {
        self.config.partitions_consumed_concurrently = limit;
        self
    }

    /// Set the minimum interval between heartbeats.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Skip drain polling in `stop`.
    pub fn test_mode(mut self, enable: bool) -> Self {
        self.config.test_mode = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
