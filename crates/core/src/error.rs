//! Error types for the Ragline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Ragline operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Vector index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Embedding errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Resolver errors ---
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    // --- Validation errors ---
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// The embedding step has exactly one hard failure mode: the provider
/// answered but produced nothing usable. Transport failures arrive via
/// the wrapped `ProviderError`.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Provider returned no usable embedding vector")]
    EmptyResult,

    #[error("Embedding request failed: {0}")]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Index service error: {message} (status: {status_code})")]
    ServiceError { status_code: u16, message: String },

    #[error("Index not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures from the model-assisted disambiguation capability.
/// These never fail a request — the router degrades to pass-through.
#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    #[error("Resolution call failed: {0}")]
    CallFailed(String),

    #[error("Unparseable resolver reply: {0}")]
    Unparseable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn embedding_error_wraps_provider() {
        let err = Error::Embedding(EmbeddingError::Provider(ProviderError::Network(
            "connection refused".into(),
        )));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn empty_embedding_is_distinct() {
        let err = EmbeddingError::EmptyResult;
        assert!(err.to_string().contains("no usable embedding"));
    }

    #[test]
    fn index_error_displays_status() {
        let err = Error::Index(IndexError::ServiceError {
            status_code: 503,
            message: "index unavailable".into(),
        });
        assert!(err.to_string().contains("503"));
    }
}
