use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use palaver_index::{FilterSpec, SearchIndex, SortSpec};
use palaver_store::{RecordStore, StoreResult};
use palaver_types::ChatError;
use palaver_types::documents::{CHAT_MESSAGE_INDEX, CONVERSATION_INDEX};
use palaver_types::models::{ChatMessage, Conversation, ConversationKind};

#[derive(Debug, Clone, Default)]
pub struct ConversationSearch {
    pub kind: Option<ConversationKind>,
    pub term: Option<String>,
    pub page_number: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone)]
pub struct MessageHistoryQuery {
    pub conversation_id: Uuid,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct MessageSearch {
    pub term: String,
    pub conversation_id: Option<Uuid>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub limit: usize,
}

/// Filtered search against the index, joined back to the record store.
///
/// The index is only a locator: every hit is re-fetched from the system
/// of record and the store's copy is what callers get, in hit order. A
/// hit whose backing record has drifted away is skipped, never an error —
/// staleness can hide results but can never fabricate them.
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn RecordStore>,
    index: Arc<dyn SearchIndex>,
}

impl SearchService {
    pub fn new(store: Arc<dyn RecordStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    pub async fn search_conversations(
        &self,
        query: ConversationSearch,
    ) -> Result<Vec<Conversation>, ChatError> {
        let mut filter = FilterSpec::new();
        if let Some(kind) = query.kind {
            filter = filter.term("kind", kind_term(kind));
        }
        if let Some(term) = query.term.as_deref().filter(|t| !t.is_empty()) {
            filter = filter.wildcard("name", term);
        }

        let hits = self
            .index
            .query(
                CONVERSATION_INDEX,
                &filter,
                &SortSpec::desc("created_at"),
                query.page_number * query.page_size,
                query.page_size,
            )
            .await
            .map_err(ChatError::internal)?;

        let ids = hit_ids(&hits, "id");
        let fetched =
            future::join_all(ids.iter().map(|id| self.store.get_conversation(*id))).await;
        Ok(join_authoritative(&ids, fetched))
    }

    pub async fn get_chat_messages(
        &self,
        query: MessageHistoryQuery,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let mut filter =
            FilterSpec::new().term("conversation_id", query.conversation_id.to_string());
        filter = sent_time_bounds(filter, query.after, query.before);

        self.hydrate_messages(&filter, query.limit).await
    }

    pub async fn search_chat_messages(
        &self,
        query: MessageSearch,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let mut filter = FilterSpec::new().wildcard("content", &query.term);
        if let Some(conversation_id) = query.conversation_id {
            filter = filter.term("conversation_id", conversation_id.to_string());
        }
        filter = sent_time_bounds(filter, query.after, query.before);

        self.hydrate_messages(&filter, query.limit).await
    }

    async fn hydrate_messages(
        &self,
        filter: &FilterSpec,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let hits = self
            .index
            .query(
                CHAT_MESSAGE_INDEX,
                filter,
                &SortSpec::desc("sent_time"),
                0,
                limit,
            )
            .await
            .map_err(ChatError::internal)?;

        let ids = hit_ids(&hits, "id");
        // Fan out per hit, join before returning; order stays the index's.
        let fetched = future::join_all(ids.iter().map(|id| self.store.get_message(*id))).await;
        Ok(join_authoritative(&ids, fetched))
    }
}

fn sent_time_bounds(
    filter: FilterSpec,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) -> FilterSpec {
    if after.is_none() && before.is_none() {
        return filter;
    }
    filter.range(
        "sent_time",
        after.map(|t| t.timestamp_millis() as f64),
        before.map(|t| t.timestamp_millis() as f64),
    )
}

fn kind_term(kind: ConversationKind) -> &'static str {
    match kind {
        ConversationKind::Private => "private",
        ConversationKind::Group => "group",
    }
}

fn hit_ids(hits: &[Value], field: &str) -> Vec<Uuid> {
    hits.iter()
        .filter_map(|hit| {
            let id = hit.get(field).and_then(Value::as_str)?;
            match id.parse() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("skipping hit with corrupt id '{}': {}", id, e);
                    None
                }
            }
        })
        .collect()
}

fn join_authoritative<T>(ids: &[Uuid], fetched: Vec<StoreResult<Option<T>>>) -> Vec<T> {
    ids.iter()
        .zip(fetched)
        .filter_map(|(id, result)| match result {
            Ok(Some(entity)) => Some(entity),
            Ok(None) => {
                debug!("index hit {} has no backing record, skipping", id);
                None
            }
            Err(e) => {
                warn!("failed to hydrate {}: {}", id, e);
                None
            }
        })
        .collect()
}
