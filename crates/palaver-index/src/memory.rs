use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{FilterSpec, IndexResult, SearchIndex, SortOrder, SortSpec};

/// In-process search index. Holds documents as raw JSON per named index
/// and evaluates the filter DSL over them. Stands in for the external
/// search cluster in tests and single-node deployments.
#[derive(Clone, Default)]
pub struct MemoryIndex {
    inner: Arc<RwLock<HashMap<String, HashMap<String, Value>>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn document_count(&self, index: &str) -> usize {
        self.inner
            .read()
            .await
            .get(index)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn upsert(&self, index: &str, doc_id: &str, document: Value) -> IndexResult<()> {
        self.inner
            .write()
            .await
            .entry(index.to_string())
            .or_default()
            .insert(doc_id.to_string(), document);
        Ok(())
    }

    async fn query(
        &self,
        index: &str,
        filter: &FilterSpec,
        sort: &SortSpec,
        from: usize,
        size: usize,
    ) -> IndexResult<Vec<Value>> {
        let guard = self.inner.read().await;
        let Some(documents) = guard.get(index) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<&Value> = documents.values().filter(|d| filter.matches(d)).collect();
        hits.sort_by(|a, b| compare_field(a, b, &sort.field, sort.order));

        Ok(hits.into_iter().skip(from).take(size).cloned().collect())
    }
}

fn compare_field(a: &Value, b: &Value, field: &str, order: SortOrder) -> Ordering {
    let ordering = match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => compare_values(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a
            .as_str()
            .unwrap_or_default()
            .cmp(b.as_str().unwrap_or_default()),
    }
}
