//! VectorIndex trait — the abstraction over the knowledge index.
//!
//! The index stores embedded document chunks and answers nearest-neighbor
//! queries. Retrieval is semantic-only: the query carries no metadata
//! filter, so relevance is decided entirely by vector similarity.
//!
//! Implementations: remote (Pinecone-style HTTP service), in-memory
//! (for testing and self-contained demos).

use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A similarity query against the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexQuery {
    /// The query embedding.
    pub vector: Vec<f32>,

    /// Number of highest-similarity items to return.
    pub top_k: usize,

    /// Whether to return stored metadata (the text field) with each match.
    #[serde(default = "default_true")]
    pub include_metadata: bool,
}

fn default_true() -> bool {
    true
}

/// A single index hit.
///
/// `text` is absent when the stored item lacks the expected metadata
/// field; the assembler drops such matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMatch {
    /// The stored item's identifier.
    pub id: String,

    /// Similarity score as reported by the index.
    pub score: f32,

    /// The text snippet stored alongside the vector, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// The core VectorIndex trait.
///
/// Matches are returned ordered by descending similarity score, exactly as
/// the index ranks them — no re-ranking happens downstream.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The index backend name (e.g., "pinecone", "in_memory").
    fn name(&self) -> &str;

    /// Run a similarity query. Service failures are fatal to the request.
    async fn query(
        &self,
        query: IndexQuery,
    ) -> std::result::Result<Vec<RetrievalMatch>, IndexError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_query_defaults_metadata_on() {
        let q: IndexQuery = serde_json::from_str(r#"{"vector":[0.1],"top_k":5}"#).unwrap();
        assert!(q.include_metadata);
        assert_eq!(q.top_k, 5);
    }

    #[test]
    fn match_without_text_deserializes() {
        let m: RetrievalMatch = serde_json::from_str(r#"{"id":"doc-1","score":0.87}"#).unwrap();
        assert_eq!(m.id, "doc-1");
        assert!(m.text.is_none());
    }

    #[test]
    fn match_serialization_skips_absent_text() {
        let m = RetrievalMatch {
            id: "doc-2".into(),
            score: 0.5,
            text: None,
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(!json.contains("text"));
    }
}
