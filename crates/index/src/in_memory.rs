//! In-memory index — useful for testing and self-contained demos.

use crate::vector::cosine_similarity;
use async_trait::async_trait;
use ragline_core::error::IndexError;
use ragline_core::index::{IndexQuery, RetrievalMatch, VectorIndex};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored record: an id, an embedding, and optional snippet text.
///
/// `text` may be `None` to model index entries whose metadata lacks the
/// expected field.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: Option<String>,
}

/// An in-memory index that ranks records by cosine similarity.
pub struct InMemoryIndex {
    records: Arc<RwLock<Vec<IndexedRecord>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Build an index pre-populated with records.
    pub fn with_records(records: Vec<IndexedRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Add a record.
    pub async fn upsert(&self, record: IndexedRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn query(&self, query: IndexQuery) -> Result<Vec<RetrievalMatch>, IndexError> {
        let records = self.records.read().await;

        let mut scored: Vec<(f32, RetrievalMatch)> = records
            .iter()
            .map(|r| {
                let score = cosine_similarity(&r.embedding, &query.vector);
                let m = RetrievalMatch {
                    id: r.id.clone(),
                    score,
                    text: if query.include_metadata {
                        r.text.clone()
                    } else {
                        None
                    },
                };
                (score, m)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(query.top_k);

        Ok(scored.into_iter().map(|(_, m)| m).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>, text: Option<&str>) -> IndexedRecord {
        IndexedRecord {
            id: id.into(),
            embedding,
            text: text.map(String::from),
        }
    }

    fn query(vector: Vec<f32>, top_k: usize) -> IndexQuery {
        IndexQuery {
            vector,
            top_k,
            include_metadata: true,
        }
    }

    #[tokio::test]
    async fn ranks_by_similarity() {
        let index = InMemoryIndex::with_records(vec![
            record("a", vec![0.0, 1.0, 0.0], Some("orthogonal")),
            record("b", vec![1.0, 0.0, 0.0], Some("identical")),
            record("c", vec![0.5, 0.5, 0.0], Some("partial")),
        ]);

        let results = index.query(query(vec![1.0, 0.0, 0.0], 10)).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "b");
        assert_eq!(results[1].id, "c");
        assert_eq!(results[2].id, "a");
    }

    #[tokio::test]
    async fn respects_top_k() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("r{i}"), vec![1.0, i as f32 * 0.1], Some("x")))
            .collect();
        let index = InMemoryIndex::with_records(records);

        let results = index.query(query(vec![1.0, 0.0], 5)).await.unwrap();
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn empty_index_returns_no_matches() {
        let index = InMemoryIndex::new();
        let results = index.query(query(vec![1.0, 0.0], 5)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn metadata_flag_controls_text() {
        let index =
            InMemoryIndex::with_records(vec![record("a", vec![1.0], Some("snippet text"))]);

        let with = index
            .query(IndexQuery {
                vector: vec![1.0],
                top_k: 5,
                include_metadata: true,
            })
            .await
            .unwrap();
        assert_eq!(with[0].text.as_deref(), Some("snippet text"));

        let without = index
            .query(IndexQuery {
                vector: vec![1.0],
                top_k: 5,
                include_metadata: false,
            })
            .await
            .unwrap();
        assert!(without[0].text.is_none());
    }

    #[tokio::test]
    async fn records_without_text_surface_as_absent() {
        let index = InMemoryIndex::with_records(vec![record("bare", vec![1.0], None)]);
        let results = index.query(query(vec![1.0], 5)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].text.is_none());
    }

    #[tokio::test]
    async fn upsert_grows_index() {
        let index = InMemoryIndex::new();
        assert!(index.is_empty().await);
        index.upsert(record("a", vec![1.0], Some("x"))).await;
        assert_eq!(index.len().await, 1);
    }
}
