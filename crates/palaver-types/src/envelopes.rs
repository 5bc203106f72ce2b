use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ChatMessage;

/// Envelope published to the pending-message topic by the RPC front door.
/// Ephemeral: consumed once logically by the ingestion worker, then gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMessage {
    /// Client-generated token matching an eventual ack back to its origin.
    /// Carries no ordering semantics.
    pub correlation_id: Uuid,
    pub conversation_id: Uuid,
    pub from_user_id: Uuid,
    pub content: String,
    pub sent_time: DateTime<Utc>,
}

/// Completion envelope published to the ack topic after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionAck {
    pub correlation_id: Uuid,
    pub outcome: IngestionOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IngestionOutcome {
    /// The message is durable in the record store.
    Persisted {
        message_id: Uuid,
        conversation_id: Uuid,
        created_at: DateTime<Utc>,
    },
    /// Terminal failure for this one submission. The worker never emits
    /// this today (persist failures drop without ack); the variant is
    /// part of the wire contract for ack-stream consumers.
    Failed { reason: String },
}

impl IngestionAck {
    pub fn persisted(correlation_id: Uuid, message: &ChatMessage) -> Self {
        Self {
            correlation_id,
            outcome: IngestionOutcome::Persisted {
                message_id: message.id,
                conversation_id: message.conversation_id,
                created_at: message.created_at,
            },
        }
    }
}
