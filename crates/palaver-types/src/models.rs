use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Private,
    Group,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub kind: ConversationKind,
    /// Set for group conversations only; private pairs have no owner.
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub participant_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Requested,
    Joined,
}

/// Membership relation row. At most one active row per
/// (conversation_id, user_id); status only ever moves Requested -> Joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
}

/// A persisted chat message. `id` and `created_at` are assigned by the
/// ingestion worker at dequeue time — never by the submitting client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub from_user_id: Uuid,
    pub content: String,
    pub sent_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
