pub mod broker;
pub mod topics;

use async_trait::async_trait;
use thiserror::Error;

pub use broker::ChannelBroker;

/// One received envelope. Redelivery is possible under the at-least-once
/// contract; consumers must tolerate seeing the same payload twice.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Partition key — the conversation id for pending messages. Ordering
    /// is guaranteed only among deliveries sharing a key.
    pub key: String,
    pub payload: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("payload of {size} bytes exceeds the {limit} byte broker limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Ordered, key-partitioned, at-least-once message transport between the
/// RPC front door and the ingestion worker.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> QueueResult<()>;

    /// Blocking receive of the next delivery on `topic`. Each topic feeds
    /// a single logical consumer group: receivers compete for deliveries,
    /// and each delivery reaches exactly one of them. `group` names that
    /// logical consumer for redelivery bookkeeping and logs.
    async fn receive(&self, topic: &str, group: &str) -> QueueResult<Delivery>;
}
