use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Conversation, ConversationKind};

// -- Conversations --

/// Identifier fields arrive as raw strings; the conversation service owns
/// validation so malformed ids map to InvalidArgument instead of a
/// transport-level rejection.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateConversationRequest {
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: String,
    pub owner_id: Option<String>,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub kind: ConversationKind,
    pub name: String,
    pub owner_id: Option<Uuid>,
    pub member_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            kind: c.kind,
            name: c.name,
            owner_id: c.owner_id,
            member_ids: c.participant_ids,
            created_at: c.created_at,
        }
    }
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChatMessageRequest {
    pub from_user_id: String,
    pub content: String,
    /// Client-side authoring time; defaults to receipt time when absent.
    pub sent_time: Option<DateTime<Utc>>,
}

/// The only thing a submitter gets back: a token to correlate the eventual
/// ack. Durability confirmation requires the ack stream or a re-query.
#[derive(Debug, Serialize)]
pub struct CreateChatMessageAck {
    pub correlation_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub from_user_id: Uuid,
    pub content: String,
    pub sent_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::ChatMessage> for ChatMessageResponse {
    fn from(m: crate::models::ChatMessage) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            from_user_id: m.from_user_id,
            content: m.content,
            sent_time: m.sent_time,
            created_at: m.created_at,
        }
    }
}
