//! Resolver trait — the pluggable disambiguation capability.
//!
//! The query router occasionally needs model assistance: deciding whether
//! an elliptical query ("what about her?") refers back to something, and
//! naming the person a finished answer was about. Both needs reduce to
//! one operation — send instructions plus input text, get a short reply —
//! so the capability is a single-method trait. The pipeline and its tests
//! depend on this seam, never on a concrete model provider.

use crate::error::ResolverError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The router's verdict for one request.
///
/// Produced fresh per request and never stored; its fields feed the
/// memory update and the retrieval step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterDecision {
    /// Self-contained query to use downstream. Equals the original query
    /// when no rewrite was needed.
    pub expanded_query: String,

    /// Whether the query was rewritten.
    pub should_rewrite: bool,

    /// The entity the query resolves to, when one could be identified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_entity: Option<String>,

    /// Human-readable explanation, for logs only.
    pub reason: String,
}

impl RouterDecision {
    /// The identity decision: pass the query through untouched.
    pub fn passthrough(query: &str, reason: impl Into<String>) -> Self {
        Self {
            expanded_query: query.to_string(),
            should_rewrite: false,
            resolved_entity: None,
            reason: reason.into(),
        }
    }
}

/// One-shot model-assisted resolution.
///
/// Implementations send `instructions` as the system message and `input`
/// as the user message, returning the raw model reply. Callers own prompt
/// construction and reply parsing; a failed or garbled call is recoverable
/// by design (the router degrades to pass-through).
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(
        &self,
        instructions: &str,
        input: &str,
    ) -> std::result::Result<String, ResolverError>;
}
