pub mod conversations;
pub mod ingest;
pub mod search;

pub use conversations::{ConversationService, CreateConversation};
pub use ingest::IngestionWorker;
pub use search::{ConversationSearch, MessageHistoryQuery, MessageSearch, SearchService};

use serde::Serialize;
use tracing::warn;

use palaver_index::SearchIndex;

/// Upsert a mirror document, swallowing failure. The search index is
/// advisory; the record store alone decides whether an operation
/// succeeded. Failures land in the log and nowhere else.
pub(crate) async fn upsert_advisory<D: Serialize>(
    index: &dyn SearchIndex,
    index_name: &str,
    doc_id: &str,
    document: &D,
) {
    let value = match serde_json::to_value(document) {
        Ok(value) => value,
        Err(e) => {
            warn!(index_name, doc_id, "could not serialize index document: {}", e);
            return;
        }
    };

    if let Err(e) = index.upsert(index_name, doc_id, value).await {
        warn!(index_name, doc_id, "index upsert failed (ignored): {}", e);
    }
}
