//! # Ragline Pipeline
//!
//! The request path from raw query to streamed, grounded answer:
//!
//! 1. Read the user's conversational memory.
//! 2. Route the query (expansion, back-reference resolution).
//! 3. Update memory with the routed query and any resolved entity.
//! 4. Embed the final query — the only pre-stream fatal step.
//! 5. Stream: lead-in, similarity search, context assembly, generation.
//! 6. After a completed answer with no resolved entity, backfill one
//!    from the answer text off the request path.
//!
//! Transports (HTTP gateway, CLI) consume the resulting `AnswerEvent`
//! channel; nothing here knows about HTTP.

pub mod assembler;
pub mod backfill;
pub mod event;
pub mod memory;
pub mod retriever;
pub mod router;
pub mod streamer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembler::{AssembledContext, ContextAssembler, CONTEXT_SEPARATOR};
pub use event::AnswerEvent;
pub use memory::{ConversationMemory, DEFAULT_TTL};
pub use retriever::{Retriever, TOP_K};
pub use router::QueryRouter;
pub use streamer::{AnswerStreamer, EMPTY_CONTEXT_MESSAGE, LEAD_IN, NO_MATCHES_MESSAGE};

use ragline_core::error::{Error, Result};
use ragline_core::memory::{ConversationStore, UserId};
use ragline_core::provider::Provider;
use ragline_core::resolver::Resolver;
use ragline_core::VectorIndex;
use std::sync::Arc;
use std::time::Duration;
use streamer::StreamOutcome;
use tokio::sync::mpsc;
use tracing::info;

/// Tunables for a pipeline. Callers map these from their config layer.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chat_model: String,
    pub embedding_model: String,
    pub answer_temperature: f32,
    pub max_context_chars: usize,
    pub memory_ttl: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o".into(),
            embedding_model: "text-embedding-ada-002".into(),
            answer_temperature: 0.4,
            max_context_chars: 16_000,
            memory_ttl: DEFAULT_TTL,
        }
    }
}

/// The assembled query pipeline. One instance serves all users; every
/// collaborator behind it is shared and thread-safe.
pub struct QueryPipeline {
    store: Arc<dyn ConversationStore>,
    router: Arc<QueryRouter>,
    retriever: Arc<Retriever>,
    assembler: Arc<ContextAssembler>,
    streamer: Arc<AnswerStreamer>,
}

impl QueryPipeline {
    /// Build a pipeline with its own TTL-bounded in-process memory.
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        resolver: Arc<dyn Resolver>,
        options: PipelineOptions,
    ) -> Self {
        let store = Arc::new(ConversationMemory::new(options.memory_ttl));
        Self::with_store(provider, index, resolver, store, options)
    }

    /// Build a pipeline around an injected conversational store.
    pub fn with_store(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        resolver: Arc<dyn Resolver>,
        store: Arc<dyn ConversationStore>,
        options: PipelineOptions,
    ) -> Self {
        let retriever = Arc::new(Retriever::new(
            provider.clone(),
            index,
            options.embedding_model.clone(),
        ));
        let assembler = Arc::new(ContextAssembler::new(options.max_context_chars));
        let streamer = Arc::new(AnswerStreamer::new(
            provider,
            options.chat_model.clone(),
            options.answer_temperature,
        ));
        Self {
            store,
            router: Arc::new(QueryRouter::new(resolver)),
            retriever,
            assembler,
            streamer,
        }
    }

    /// Answer a query for a user, returning the event stream.
    ///
    /// Errors returned here happened before any output was produced, so
    /// transports can still send a clean failure response. Once `Ok` is
    /// returned, all further outcomes arrive as events.
    pub async fn answer(&self, query: &str, user: UserId) -> Result<mpsc::Receiver<AnswerEvent>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidQuery(
                "query must be a non-empty string".into(),
            ));
        }

        let record = self.store.get(&user);
        let decision = self.router.route(query, &record, &user).await;
        info!(
            user = %user,
            rewritten = decision.should_rewrite,
            reason = %decision.reason,
            "query routed"
        );

        // Memory reflects the routed query even if later steps fail.
        self.store.set_query(&user, &decision.expanded_query);
        if let Some(entity) = &decision.resolved_entity {
            self.store.set_entity(&user, entity);
        }

        let vector = self.retriever.embed(&decision.expanded_query).await?;

        let (tx, rx) = mpsc::channel(64);
        let streamer = Arc::clone(&self.streamer);
        let retriever = Arc::clone(&self.retriever);
        let assembler = Arc::clone(&self.assembler);
        let router = Arc::clone(&self.router);
        let store = Arc::clone(&self.store);
        let resolved_entity = decision.resolved_entity.clone();
        let final_query = decision.expanded_query.clone();

        tokio::spawn(async move {
            let outcome = streamer
                .run(&retriever, &assembler, &final_query, vector, &tx)
                .await;
            if let StreamOutcome::Completed { answer } = outcome {
                let _ = tx
                    .send(AnswerEvent::Done {
                        answer: answer.clone(),
                        resolved_entity: resolved_entity.clone(),
                    })
                    .await;
                if resolved_entity.is_none() && !answer.is_empty() {
                    drop(backfill::spawn_backfill(router, store, user, answer));
                }
            }
        });

        Ok(rx)
    }
}
