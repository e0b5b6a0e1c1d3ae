//! Embedding and vector search for the pipeline.

use ragline_core::error::{EmbeddingError, IndexError};
use ragline_core::index::{IndexQuery, RetrievalMatch, VectorIndex};
use ragline_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use tracing::debug;

/// Fixed number of matches requested per query.
pub const TOP_K: usize = 5;

/// Embeds queries and runs similarity search against the index.
///
/// Both failure modes here are fatal to the request: without a query
/// vector there is nothing to search with, and an index failure leaves
/// nothing to ground an answer on.
pub struct Retriever {
    provider: Arc<dyn Provider>,
    index: Arc<dyn VectorIndex>,
    embedding_model: String,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            index,
            embedding_model: embedding_model.into(),
        }
    }

    /// Embed the query text. An empty or missing vector is an error in
    /// its own right, distinct from transport failures.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let started = std::time::Instant::now();
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await?;

        let vector = response
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::EmptyResult)?;

        debug!(
            dims = vector.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query embedded"
        );
        Ok(vector)
    }

    /// Top-k similarity search. Matches come back in the index's ranking
    /// order and are never re-ranked here.
    pub async fn search(&self, vector: Vec<f32>) -> Result<Vec<RetrievalMatch>, IndexError> {
        let started = std::time::Instant::now();
        let matches = self
            .index
            .query(IndexQuery {
                vector,
                top_k: TOP_K,
                include_metadata: true,
            })
            .await?;

        debug!(
            index = self.index.name(),
            matches = matches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "similarity search complete"
        );
        Ok(matches)
    }
}
