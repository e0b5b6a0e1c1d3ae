//! Remote index client — Pinecone-style HTTP service.
//!
//! Speaks the `POST {host}/query` protocol: a JSON body with the query
//! vector, `topK`, and `includeMetadata`; matches come back with a score
//! and a metadata object whose `text` field holds the stored snippet.

use async_trait::async_trait;
use ragline_core::error::IndexError;
use ragline_core::index::{IndexQuery, RetrievalMatch, VectorIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Client for a remote vector index service.
pub struct RemoteIndex {
    host: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteIndex {
    /// Create a client for the index at `host`.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| IndexError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    fn name(&self) -> &str {
        "remote"
    }

    async fn query(&self, query: IndexQuery) -> Result<Vec<RetrievalMatch>, IndexError> {
        let url = format!("{}/query", self.host);

        let body = ApiQuery {
            vector: query.vector,
            top_k: query.top_k,
            include_metadata: query.include_metadata,
        };

        debug!(host = %self.host, top_k = query.top_k, "Querying vector index");

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Index service returned error");
            return Err(IndexError::ServiceError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiQueryResponse =
            response
                .json()
                .await
                .map_err(|e| IndexError::ServiceError {
                    status_code: 200,
                    message: format!("Failed to parse index response: {e}"),
                })?;

        let matches = api_response
            .matches
            .into_iter()
            .map(|m| RetrievalMatch {
                id: m.id,
                score: m.score,
                text: m.metadata.and_then(|md| md.text),
            })
            .collect();

        Ok(matches)
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiQuery {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct ApiQueryResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<ApiMetadata>,
}

#[derive(Debug, Deserialize)]
struct ApiMetadata {
    #[serde(default)]
    text: Option<String>,
}
