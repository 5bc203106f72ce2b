use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use palaver_types::models::{ChatMessage, Conversation, Participant};

use crate::{RecordStore, StoreResult};

/// In-memory record store for tests and for substituting the durable tier
/// during development. Same contract as the SQLite store, including
/// last-write-wins on conversation inserts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, ChatMessage>,
    participants: Vec<Participant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn conversation_count(&self) -> usize {
        self.inner.read().await.conversations.len()
    }

    pub async fn message_count(&self) -> usize {
        self.inner.read().await.messages.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>> {
        Ok(self.inner.read().await.conversations.get(&id).cloned())
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn get_message(&self, id: Uuid) -> StoreResult<Option<ChatMessage>> {
        Ok(self.inner.read().await.messages.get(&id).cloned())
    }

    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .messages
            .insert(message.id, message.clone());
        Ok(())
    }

    async fn insert_participant(&self, participant: &Participant) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let exists = inner.participants.iter().any(|p| {
            p.conversation_id == participant.conversation_id
                && p.user_id == participant.user_id
                && p.status == participant.status
        });
        if !exists {
            inner.participants.push(participant.clone());
        }
        Ok(())
    }

    async fn list_participants(&self, conversation_id: Uuid) -> StoreResult<Vec<Participant>> {
        Ok(self
            .inner
            .read()
            .await
            .participants
            .iter()
            .filter(|p| p.conversation_id == conversation_id)
            .cloned()
            .collect())
    }
}
