use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use palaver_index::SearchIndex;
use palaver_store::RecordStore;
use palaver_types::ChatError;
use palaver_types::documents::{CONVERSATION_INDEX, ConversationDocument, PARTICIPANT_INDEX,
    ParticipantDocument};
use palaver_types::identity;
use palaver_types::models::{Conversation, ConversationKind, Participant, ParticipantStatus};

use crate::upsert_advisory;

#[derive(Debug, Clone)]
pub struct CreateConversation {
    pub kind: ConversationKind,
    pub name: String,
    pub owner_id: Option<String>,
    pub member_ids: Vec<String>,
}

/// Idempotent get-or-create over the record store, with advisory mirroring
/// into the search index.
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn RecordStore>,
    index: Arc<dyn SearchIndex>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn RecordStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    /// Creates a conversation, or for a private pair that already exists,
    /// returns the existing record untouched.
    ///
    /// The get-then-insert window is not atomic: two concurrent private
    /// creators can both miss the get and both insert. They target the
    /// same deterministic id, so the store resolves it last-write-wins.
    pub async fn create(&self, req: CreateConversation) -> Result<Conversation, ChatError> {
        let owner_id = match req.kind {
            ConversationKind::Group => {
                let raw = req
                    .owner_id
                    .as_deref()
                    .ok_or_else(|| ChatError::invalid("ownerId is required for group conversations"))?;
                let parsed: Uuid = raw
                    .parse()
                    .map_err(|_| ChatError::invalid("invalid ownerId"))?;
                Some(parsed)
            }
            ConversationKind::Private => None,
        };

        let member_ids = parse_members(req.kind, &req.member_ids)?;
        let resolved = identity::resolve(req.kind, &member_ids);

        if req.kind == ConversationKind::Private {
            if let Some(existing) = self
                .store
                .get_conversation(resolved.id)
                .await
                .map_err(ChatError::internal)?
            {
                return Ok(existing);
            }
        }

        let conversation = Conversation {
            id: resolved.id,
            kind: req.kind,
            owner_id,
            name: req.name,
            participant_ids: member_ids.clone(),
            created_at: Utc::now(),
        };

        self.store
            .insert_conversation(&conversation)
            .await
            .map_err(ChatError::internal)?;

        upsert_advisory(
            self.index.as_ref(),
            CONVERSATION_INDEX,
            &conversation.id.to_string(),
            &ConversationDocument::from(&conversation),
        )
        .await;

        if req.kind == ConversationKind::Group {
            for user_id in &member_ids {
                let participant = Participant {
                    conversation_id: conversation.id,
                    user_id: *user_id,
                    status: ParticipantStatus::Joined,
                    joined_at: conversation.created_at,
                };
                self.store
                    .insert_participant(&participant)
                    .await
                    .map_err(ChatError::internal)?;

                let doc_id = format!("{}:{}", participant.conversation_id, participant.user_id);
                upsert_advisory(
                    self.index.as_ref(),
                    PARTICIPANT_INDEX,
                    &doc_id,
                    &ParticipantDocument::from(&participant),
                )
                .await;
            }
        }

        Ok(conversation)
    }

    pub async fn find(&self, id: Uuid) -> Result<Conversation, ChatError> {
        self.store
            .get_conversation(id)
            .await
            .map_err(ChatError::internal)?
            .ok_or_else(|| ChatError::not_found(format!("conversation {}", id)))
    }
}

fn parse_members(kind: ConversationKind, raw: &[String]) -> Result<Vec<Uuid>, ChatError> {
    match kind {
        // Private identity is derived from the pair, so both ids must be
        // well-formed. Duplicate ids (a self-conversation) are accepted.
        ConversationKind::Private => {
            if raw.len() != 2 {
                return Err(ChatError::invalid(
                    "private conversations take exactly two memberIds",
                ));
            }
            raw.iter()
                .map(|s| {
                    s.parse()
                        .map_err(|_| ChatError::invalid(format!("invalid memberId: {}", s)))
                })
                .collect()
        }
        // Group membership is advisory at creation; unparseable ids are
        // skipped rather than failing the whole call.
        ConversationKind::Group => Ok(raw
            .iter()
            .filter_map(|s| match s.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("skipping malformed group memberId: {}", s);
                    None
                }
            })
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use palaver_index::{FilterSpec, IndexError, IndexResult, MemoryIndex, SortSpec};
    use palaver_store::MemoryStore;
    use serde_json::Value;

    fn service(store: MemoryStore, index: MemoryIndex) -> ConversationService {
        ConversationService::new(Arc::new(store), Arc::new(index))
    }

    fn private_request(a: Uuid, b: Uuid) -> CreateConversation {
        CreateConversation {
            kind: ConversationKind::Private,
            name: String::new(),
            owner_id: None,
            member_ids: vec![a.to_string(), b.to_string()],
        }
    }

    #[tokio::test]
    async fn private_creation_is_idempotent_across_orderings() {
        let store = MemoryStore::new();
        let svc = service(store.clone(), MemoryIndex::new());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = svc.create(private_request(a, b)).await.unwrap();
        let second = svc.create(private_request(b, a)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn group_creation_records_joined_members() {
        let store = MemoryStore::new();
        let index = MemoryIndex::new();
        let svc = service(store.clone(), index.clone());
        let owner = Uuid::new_v4();
        let members = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        let conversation = svc
            .create(CreateConversation {
                kind: ConversationKind::Group,
                name: "weekend hike".into(),
                owner_id: Some(owner.to_string()),
                member_ids: members.iter().map(Uuid::to_string).collect(),
            })
            .await
            .unwrap();

        assert_eq!(conversation.owner_id, Some(owner));

        let rows = store.list_participants(conversation.id).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|p| p.status == ParticipantStatus::Joined));

        assert_eq!(index.document_count(CONVERSATION_INDEX).await, 1);
        assert_eq!(index.document_count(PARTICIPANT_INDEX).await, 3);
    }

    #[tokio::test]
    async fn group_without_valid_owner_is_rejected() {
        let svc = service(MemoryStore::new(), MemoryIndex::new());

        let err = svc
            .create(CreateConversation {
                kind: ConversationKind::Group,
                name: "x".into(),
                owner_id: Some("not-a-uuid".into()),
                member_ids: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn find_missing_conversation_is_not_found() {
        let svc = service(MemoryStore::new(), MemoryIndex::new());

        let err = svc.find(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    struct BrokenIndex;

    #[async_trait]
    impl palaver_index::SearchIndex for BrokenIndex {
        async fn upsert(&self, _: &str, _: &str, _: Value) -> IndexResult<()> {
            Err(IndexError::Backend("cluster unreachable".into()))
        }

        async fn query(
            &self,
            _: &str,
            _: &FilterSpec,
            _: &SortSpec,
            _: usize,
            _: usize,
        ) -> IndexResult<Vec<Value>> {
            Err(IndexError::Backend("cluster unreachable".into()))
        }
    }

    #[tokio::test]
    async fn index_failure_does_not_fail_creation() {
        let store = MemoryStore::new();
        let svc = ConversationService::new(Arc::new(store.clone()), Arc::new(BrokenIndex));
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let conversation = svc.create(private_request(a, b)).await.unwrap();

        assert_eq!(store.conversation_count().await, 1);
        assert!(
            store
                .get_conversation(conversation.id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
