//! Fetched batches and messages

use std::collections::HashMap;

/// Offsets keyed by `(topic, partition)`. Used both for uncommitted-offset
/// snapshots and for explicit commits.
pub type OffsetsByPartition = HashMap<(String, i32), i64>;

/// A single message inside a batch. Read-only; its lifetime is bounded by
/// the batch that carries it.
#[derive(Debug, Clone)]
pub struct Message {
    /// Offset within the partition, monotonic per partition
    pub offset: i64,
    /// Optional message key
    pub key: Option<Vec<u8>>,
    /// Optional message value
    pub value: Option<Vec<u8>>,
    /// Broker timestamp in milliseconds
    pub timestamp: i64,
    /// Message headers
    pub headers: HashMap<String, Vec<u8>>,
}

impl Message {
    /// Create a message with an offset and value, no key or headers.
    pub fn new(offset: i64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            key: None,
            value: Some(value.into()),
            timestamp: 0,
            headers: HashMap::new(),
        }
    }
}

/// One fetch response worth of messages for a single topic-partition.
/// Produced by a fetch cycle and consumed exactly once.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Topic the batch was fetched from
    pub topic: String,
    /// Partition the batch was fetched from
    pub partition: i32,
    /// Offset of the next message the broker would append
    pub high_watermark: i64,
    /// Messages in offset order
    pub messages: Vec<Message>,
}

impl Batch {
    /// Create a batch for a topic-partition.
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        high_watermark: i64,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            high_watermark,
            messages,
        }
    }

    /// Offset of the first message, if any.
    pub fn first_offset(&self) -> Option<i64> {
        self.messages.first().map(|m| m.offset)
    }

    /// Offset of the last message. An empty batch reports the offset just
    /// below the high watermark so lag math stays consistent.
    pub fn last_offset(&self) -> i64 {
        self.messages
            .last()
            .map(|m| m.offset)
            .unwrap_or(self.high_watermark - 1)
    }

    /// Distance between the last message and the head of the partition.
    pub fn offset_lag(&self) -> i64 {
        (self.high_watermark - 1 - self.last_offset()).max(0)
    }

    /// True when the fetch returned no messages for this partition.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
