pub mod memory;
pub mod migrations;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use palaver_types::models::{ChatMessage, Conversation, Participant};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The system of record. Absence is data (`Ok(None)`), never an error;
/// `Err` means the storage tier itself failed.
///
/// Implementations are long-lived, shared handles, safe for concurrent use
/// by every component in the process.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>>;
    async fn insert_conversation(&self, conversation: &Conversation) -> StoreResult<()>;

    async fn get_message(&self, id: Uuid) -> StoreResult<Option<ChatMessage>>;
    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()>;

    async fn insert_participant(&self, participant: &Participant) -> StoreResult<()>;
    async fn list_participants(&self, conversation_id: Uuid) -> StoreResult<Vec<Participant>>;
}
