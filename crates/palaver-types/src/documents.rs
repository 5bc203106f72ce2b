use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ChatMessage, Conversation, ConversationKind, Participant};

/// Fixed index names, one per entity type.
pub const CONVERSATION_INDEX: &str = "chat_conversations";
pub const CHAT_MESSAGE_INDEX: &str = "chat_messages";
pub const PARTICIPANT_INDEX: &str = "chat_participants";

/// Denormalized mirror of a conversation for the search tier. Timestamps
/// are epoch milliseconds so range filters stay numeric. The search index
/// is a locator only — these fields are never served back to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDocument {
    pub id: Uuid,
    pub kind: ConversationKind,
    pub name: String,
    pub member_ids: Vec<Uuid>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageDocument {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub from_user_id: Uuid,
    pub content: String,
    pub sent_time: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDocument {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub status: crate::models::ParticipantStatus,
    pub created_at: i64,
}

impl From<&Conversation> for ConversationDocument {
    fn from(entity: &Conversation) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            name: entity.name.clone(),
            member_ids: entity.participant_ids.clone(),
            created_at: entity.created_at.timestamp_millis(),
        }
    }
}

impl From<&ChatMessage> for ChatMessageDocument {
    fn from(entity: &ChatMessage) -> Self {
        Self {
            id: entity.id,
            conversation_id: entity.conversation_id,
            from_user_id: entity.from_user_id,
            content: entity.content.clone(),
            sent_time: entity.sent_time.timestamp_millis(),
            created_at: entity.created_at.timestamp_millis(),
        }
    }
}

impl From<&Participant> for ParticipantDocument {
    fn from(entity: &Participant) -> Self {
        Self {
            conversation_id: entity.conversation_id,
            user_id: entity.user_id,
            status: entity.status,
            created_at: entity.joined_at.timestamp_millis(),
        }
    }
}
