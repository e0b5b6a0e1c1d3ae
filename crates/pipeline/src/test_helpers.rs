//! Shared test doubles for pipeline tests.

use crate::event::AnswerEvent;
use ragline_core::error::{ProviderError, ResolverError};
use ragline_core::message::Message;
use ragline_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, StreamChunk,
    Usage,
};
use ragline_core::resolver::Resolver;
use tokio::sync::mpsc;

/// Deterministic embedding every mock returns; index fixtures in tests
/// use vectors of the same dimension.
pub const TEST_EMBEDDING: [f32; 2] = [1.0, 0.0];

fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

fn make_embedding_response() -> EmbeddingResponse {
    EmbeddingResponse {
        embeddings: vec![TEST_EMBEDDING.to_vec()],
        model: "mock-embedding-model".into(),
        usage: None,
    }
}

/// Returns one fixed answer for every completion and a fixed embedding.
/// Streaming goes through the trait's single-chunk default.
pub struct StaticProvider {
    answer: String,
}

impl StaticProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for StaticProvider {
    fn name(&self) -> &str {
        "static_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(make_text_response(&self.answer))
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        Ok(make_embedding_response())
    }
}

/// Streams a scripted sequence of content deltas, then a done chunk.
pub struct ChunkedProvider {
    chunks: Vec<String>,
}

impl ChunkedProvider {
    pub fn new(chunks: Vec<&str>) -> Self {
        Self {
            chunks: chunks.into_iter().map(String::from).collect(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ChunkedProvider {
    fn name(&self) -> &str {
        "chunked_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(make_text_response(&self.chunks.concat()))
    }

    async fn stream(
        &self,
        _request: ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
        let (tx, rx) = mpsc::channel(16);
        let chunks = self.chunks.clone();
        tokio::spawn(async move {
            for content in chunks {
                let _ = tx
                    .send(Ok(StreamChunk {
                        content: Some(content),
                        done: false,
                        usage: None,
                    }))
                    .await;
            }
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                    usage: None,
                }))
                .await;
        });
        Ok(rx)
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        Ok(make_embedding_response())
    }
}

/// Streams one delta, then holds the rest until the gate is released.
/// Lets tests drop the event receiver at a known point mid-generation.
pub struct GatedProvider {
    first: String,
    rest: Vec<String>,
    gate: std::sync::Arc<tokio::sync::Notify>,
}

impl GatedProvider {
    pub fn new(first: &str, rest: Vec<&str>) -> Self {
        Self {
            first: first.to_string(),
            rest: rest.into_iter().map(String::from).collect(),
            gate: std::sync::Arc::new(tokio::sync::Notify::new()),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait::async_trait]
impl Provider for GatedProvider {
    fn name(&self) -> &str {
        "gated_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("mock: complete unavailable".into()))
    }

    async fn stream(
        &self,
        _request: ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
        let (tx, rx) = mpsc::channel(16);
        let first = self.first.clone();
        let rest = self.rest.clone();
        let gate = self.gate.clone();
        tokio::spawn(async move {
            let _ = tx
                .send(Ok(StreamChunk {
                    content: Some(first),
                    done: false,
                    usage: None,
                }))
                .await;
            gate.notified().await;
            for content in rest {
                let _ = tx
                    .send(Ok(StreamChunk {
                        content: Some(content),
                        done: false,
                        usage: None,
                    }))
                    .await;
            }
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                    usage: None,
                }))
                .await;
        });
        Ok(rx)
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        Ok(make_embedding_response())
    }
}

/// Streams a few deltas, then fails mid-stream.
pub struct BrokenStreamProvider {
    chunks: Vec<String>,
}

impl BrokenStreamProvider {
    pub fn new(chunks: Vec<&str>) -> Self {
        Self {
            chunks: chunks.into_iter().map(String::from).collect(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for BrokenStreamProvider {
    fn name(&self) -> &str {
        "broken_stream_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("mock: complete unavailable".into()))
    }

    async fn stream(
        &self,
        _request: ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
        let (tx, rx) = mpsc::channel(16);
        let chunks = self.chunks.clone();
        tokio::spawn(async move {
            for content in chunks {
                let _ = tx
                    .send(Ok(StreamChunk {
                        content: Some(content),
                        done: false,
                        usage: None,
                    }))
                    .await;
            }
            let _ = tx
                .send(Err(ProviderError::StreamInterrupted(
                    "mock: connection dropped".into(),
                )))
                .await;
        });
        Ok(rx)
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        Ok(make_embedding_response())
    }
}

/// Every operation fails. For asserting that a path is never taken, or
/// that failure degrades instead of propagating.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("mock: always fails".into()))
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::Network("mock: always fails".into()))
    }
}

/// Embeds "successfully" but with nothing in the result.
pub struct EmptyEmbeddingProvider;

#[async_trait::async_trait]
impl Provider for EmptyEmbeddingProvider {
    fn name(&self) -> &str {
        "empty_embedding_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("mock: complete unavailable".into()))
    }

    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: vec![],
            model: "mock-embedding-model".into(),
            usage: None,
        })
    }
}

/// Resolver returning one fixed reply for every call.
pub struct ScriptedResolver {
    reply: String,
}

impl ScriptedResolver {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, _instructions: &str, _input: &str) -> Result<String, ResolverError> {
        Ok(self.reply.clone())
    }
}

/// Resolver that always fails. Routing must degrade, never propagate.
pub struct FailingResolver;

#[async_trait::async_trait]
impl Resolver for FailingResolver {
    async fn resolve(&self, _instructions: &str, _input: &str) -> Result<String, ResolverError> {
        Err(ResolverError::CallFailed("mock: resolver down".into()))
    }
}

/// Drain a receiver into a vector. The sender must already be dropped or
/// guaranteed to finish.
pub async fn collect_events(mut rx: mpsc::Receiver<AnswerEvent>) -> Vec<AnswerEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
