//! Consumer group runner for Kafka-protocol clients
//!
//! This library drives a single consumer group member through its
//! lifecycle: the join/sync handshake, the fetch-process-commit loop,
//! heartbeat cadence, bounded per-partition concurrency, rebalance
//! recovery, and graceful shutdown. Wire-protocol sequencing lives behind
//! the [`ConsumerGroup`] trait; the runner only consumes its contract.
//!
//! # Example
//!
//! ```no_run
//! use kafka_runner::{Handler, Message, MessageHandler, Runner, RunnerConfig, RunnerResult};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct PrintHandler;
//!
//! #[async_trait]
//! impl MessageHandler for PrintHandler {
//!     async fn each_message(
//!         &self,
//!         topic: &str,
//!         partition: i32,
//!         message: &Message,
//!     ) -> RunnerResult<()> {
//!         tracing::info!(topic, partition, offset = message.offset, "consumed");
//!         Ok(())
//!     }
//! }
//!
//! # async fn example(group: Arc<dyn kafka_runner::ConsumerGroup>) -> RunnerResult<()> {
//! let config = RunnerConfig::builder()
//!     .partitions_consumed_concurrently(3)
//!     .build();
//!
//! let runner = Arc::new(Runner::new(
//!     group,
//!     Handler::Message(Arc::new(PrintHandler)),
//!     config,
//! )?);
//!
//! runner.start().await;
//! // ... later
//! runner.stop().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

// Re-export commonly used items
pub use batch::{Batch, Message, OffsetsByPartition};
pub use config::{RunnerConfig, RunnerConfigBuilder};
pub use error::{RunnerError, RunnerResult};
pub use group::ConsumerGroup;
pub use handler::{BatchContext, BatchHandler, Handler, MessageHandler};
pub use instrumentation::{InstrumentationEmitter, InstrumentationEvent, TracingEmitter};
pub use limiter::ConcurrencyLimiter;
pub use retry::{RetryContext, RetryExecutor, RetryPolicy, RetrySignal};
pub use runner::{CrashHandler, Runner};

/// Fetched batches and messages
pub mod batch;

/// Runner configuration
pub mod config;

/// Error types
pub mod error;

/// Consumer group collaborator contract
pub mod group;

/// User handler traits and the batch control surface
pub mod handler;

/// Instrumentation events
pub mod instrumentation;

/// Bounded concurrency for batch processing
pub mod limiter;

/// Retry policies and the retry driver
pub mod retry;

/// The consumer runner
pub mod runner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber with default settings
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
