pub mod filter;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use filter::{Filter, FilterSpec, SortOrder, SortSpec};
pub use memory::MemoryIndex;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("index error: {0}")]
    Backend(String),
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Derived, best-effort mirror of the record store. Never authoritative:
/// callers use it to locate ids, then re-fetch from the system of record.
/// Upsert failures are advisory everywhere in this codebase — logged by
/// the caller and deliberately discarded.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn upsert(&self, index: &str, doc_id: &str, document: Value) -> IndexResult<()>;

    async fn query(
        &self,
        index: &str,
        filter: &FilterSpec,
        sort: &SortSpec,
        from: usize,
        size: usize,
    ) -> IndexResult<Vec<Value>>;
}
