//! User handler traits and the batch control surface

use crate::batch::{Batch, Message, OffsetsByPartition};
use crate::error::RunnerResult;
use crate::group::ConsumerGroup;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handler invoked once per message, in offset order within a partition.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Process one message. An error aborts the batch; offsets resolved
    /// before the failing message are committed first.
    async fn each_message(
        &self,
        topic: &str,
        partition: i32,
        message: &Message,
    ) -> RunnerResult<()>;
}

/// Handler invoked once per batch with a control surface for offset
/// resolution, heartbeats, and commits.
#[async_trait]
pub trait BatchHandler: Send + Sync + 'static {
    /// Process one batch. Unless `each_batch_auto_resolve` is enabled, the
    /// handler owns offset advancement through [`BatchContext`].
    async fn each_batch(&self, context: BatchContext<'_>) -> RunnerResult<()>;
}

/// The handler shape chosen at runner construction. Exactly one of the two
/// modes drives every batch.
#[derive(Clone)]
pub enum Handler {
    /// Message-at-a-time processing
    Message(Arc<dyn MessageHandler>),
    /// Whole-batch processing
    Batch(Arc<dyn BatchHandler>),
}

/// Control surface handed to a [`BatchHandler`] invocation. Immutable per
/// invocation; captures the current batch context.
pub struct BatchContext<'a> {
    batch: &'a Batch,
    group: &'a dyn ConsumerGroup,
    running: &'a AtomicBool,
    heartbeat_interval: Duration,
}

impl<'a> BatchContext<'a> {
    pub(crate) fn new(
        batch: &'a Batch,
        group: &'a dyn ConsumerGroup,
        running: &'a AtomicBool,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            batch,
            group,
            running,
            heartbeat_interval,
        }
    }

    /// The batch being processed.
    pub fn batch(&self) -> &Batch {
        self.batch
    }

    /// Mark `offset` as processed and eligible for commit for this
    /// batch's topic-partition.
    pub fn resolve_offset(&self, offset: i64) {
        self.group
            .resolve_offset(&self.batch.topic, self.batch.partition, offset);
    }

    /// Send a heartbeat, throttled to the configured interval.
    pub async fn heartbeat(&self) -> RunnerResult<()> {
        self.group.heartbeat(self.heartbeat_interval).await
    }

    /// Commit the given offsets, or let the group commit resolved offsets
    /// according to its thresholds when `offsets` is `None`.
    pub async fn commit_offsets_if_necessary(
        &self,
        offsets: Option<OffsetsByPartition>,
    ) -> RunnerResult<()> {
        match offsets {
            Some(offsets) => self.group.commit_offsets(Some(offsets)).await,
            None => self.group.commit_offsets_if_necessary().await,
        }
    }

    /// Snapshot of offsets resolved but not yet committed.
    pub async fn uncommitted_offsets(&self) -> OffsetsByPartition {
        self.group.uncommitted_offsets().await
    }

    /// Current runner lifecycle flag. Long-running handlers should check
    /// this between messages to cooperate with shutdown.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// True once a seek has invalidated this batch. A stale batch must not
    /// advance committed offsets.
    pub fn is_stale(&self) -> bool {
        self.group
            .has_seek_offset(&self.batch.topic, self.batch.partition)
    }
}
