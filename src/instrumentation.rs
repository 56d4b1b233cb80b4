//! Instrumentation events emitted by the runner

use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// Structured events describing runner progress.
#[derive(Debug, Clone)]
pub enum InstrumentationEvent {
    /// The member joined (or re-joined) the group
    GroupJoin {
        /// Group id
        group_id: String,
        /// Member id assigned by the coordinator
        member_id: Option<String>,
        /// Member id of the group leader
        leader_id: Option<String>,
        /// Whether this member leads the group
        is_leader: bool,
        /// Partitions assigned to this member, keyed by topic
        member_assignment: HashMap<String, Vec<i32>>,
        /// Assignment protocol agreed during the join
        group_protocol: Option<String>,
        /// Time spent in the join/sync handshake
        duration: Duration,
    },
    /// One fetch returned
    Fetch {
        /// Batches returned across all partitions
        number_of_batches: usize,
        /// Time spent in the fetch RPC
        duration: Duration,
    },
    /// Processing of one batch started
    StartBatchProcess {
        /// Topic of the batch
        topic: String,
        /// Partition of the batch
        partition: i32,
        /// High watermark reported by the broker
        high_watermark: i64,
        /// Lag behind the partition head
        offset_lag: i64,
        /// Number of messages in the batch
        batch_size: usize,
        /// First message offset, if any
        first_offset: Option<i64>,
        /// Last message offset
        last_offset: i64,
    },
    /// Processing of one batch finished
    EndBatchProcess {
        /// Topic of the batch
        topic: String,
        /// Partition of the batch
        partition: i32,
        /// High watermark reported by the broker
        high_watermark: i64,
        /// Lag behind the partition head
        offset_lag: i64,
        /// Number of messages in the batch
        batch_size: usize,
        /// First message offset, if any
        first_offset: Option<i64>,
        /// Last message offset
        last_offset: i64,
        /// Time spent processing the batch
        duration: Duration,
    },
}

/// Sink for instrumentation events.
pub trait InstrumentationEmitter: Send + Sync + 'static {
    /// Deliver one event. Must not block.
    fn emit(&self, event: InstrumentationEvent);
}

/// Default emitter that logs every event as a structured tracing event.
#[derive(Debug, Default)]
pub struct TracingEmitter;

impl InstrumentationEmitter for TracingEmitter {
    fn emit(&self, event: InstrumentationEvent) {
        match event {
            InstrumentationEvent::GroupJoin {
                group_id,
                member_id,
                leader_id,
                is_leader,
                group_protocol,
                duration,
                ..
            } => info!(
                %group_id,
                member_id = member_id.as_deref().unwrap_or(""),
                leader_id = leader_id.as_deref().unwrap_or(""),
                is_leader,
                group_protocol = group_protocol.as_deref().unwrap_or(""),
                duration_ms = duration.as_millis() as u64,
                "consumer has joined the group"
            ),
            InstrumentationEvent::Fetch {
                number_of_batches,
                duration,
            } => info!(
                number_of_batches,
                duration_ms = duration.as_millis() as u64,
                "fetch completed"
            ),
            InstrumentationEvent::StartBatchProcess {
                topic,
                partition,
                batch_size,
                offset_lag,
                ..
            } => info!(%topic, partition, batch_size, offset_lag, "batch processing started"),
            InstrumentationEvent::EndBatchProcess {
                topic,
                partition,
                batch_size,
                duration,
                ..
            } => info!(
                %topic,
                partition,
                batch_size,
                duration_ms = duration.as_millis() as u64,
                "batch processing finished"
            ),
        }
    }
}
