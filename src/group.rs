//! Consumer group collaborator contract
//!
//! The runner drives the join/sync handshake, the fetch loop, and the
//! commit/heartbeat cadence through this trait. The implementation owns all
//! RPC sequencing, offset cursors, and seek overrides; the runner never
//! touches the wire.

use crate::batch::{Batch, OffsetsByPartition};
use crate::error::RunnerResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Group membership, fetch, and offset operations consumed by the runner.
///
/// Commits and heartbeats may be issued from multiple partition tasks
/// concurrently; implementations must serialize them internally.
#[async_trait]
pub trait ConsumerGroup: Send + Sync + 'static {
    /// Join the group through the coordinator.
    async fn join(&self) -> RunnerResult<()>;

    /// Sync group state after a join, receiving the member assignment.
    async fn sync(&self) -> RunnerResult<()>;

    /// Leave the group.
    async fn leave(&self) -> RunnerResult<()>;

    /// Fetch the next batches across all assigned partitions, at most one
    /// batch per partition.
    async fn fetch(&self) -> RunnerResult<Vec<Batch>>;

    /// Send a heartbeat. Self-throttling: a no-op when called again before
    /// `interval` has elapsed.
    async fn heartbeat(&self, interval: Duration) -> RunnerResult<()>;

    /// Commit the given offsets, or every resolved offset when `offsets`
    /// is `None`.
    async fn commit_offsets(&self, offsets: Option<OffsetsByPartition>) -> RunnerResult<()>;

    /// Commit resolved offsets if the commit interval or count thresholds
    /// have been met.
    async fn commit_offsets_if_necessary(&self) -> RunnerResult<()>;

    /// Snapshot of offsets resolved but not yet committed.
    async fn uncommitted_offsets(&self) -> OffsetsByPartition;

    /// Mark an offset as processed and eligible for commit.
    fn resolve_offset(&self, topic: &str, partition: i32, offset: i64);

    /// True when a seek has repositioned the partition cursor, invalidating
    /// any in-flight batch for it.
    fn has_seek_offset(&self, topic: &str, partition: i32) -> bool;

    /// Group id this member belongs to.
    fn group_id(&self) -> String;

    /// Member id assigned by the coordinator, when joined.
    fn member_id(&self) -> Option<String>;

    /// Forget the member id so the next join re-identifies the member.
    fn clear_member_id(&self);

    /// Member id of the group leader, when known.
    fn leader_id(&self) -> Option<String>;

    /// True when this member is the group leader.
    fn is_leader(&self) -> bool;

    /// Partitions assigned to this member, keyed by topic.
    fn member_assignment(&self) -> HashMap<String, Vec<i32>>;

    /// Assignment protocol agreed during the last join, when known.
    fn group_protocol(&self) -> Option<String>;
}
