//! The answer streamer: retrieval through generation as a state machine.
//!
//! Runs on the stream side of the request, after the query has been
//! routed and embedded. Emits `AnswerEvent`s into the caller's channel
//! and reports how the stream ended so the pipeline can finish up
//! (emit `Done`, schedule backfill).

use crate::assembler::{AssembledContext, ContextAssembler};
use crate::event::AnswerEvent;
use crate::retriever::Retriever;
use ragline_core::message::Message;
use ragline_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Fixed prefix emitted before anything else on every answer stream.
pub const LEAD_IN: &str = "Agent's Reply:- ";

/// User-facing notice when retrieval finds nothing.
pub const NO_MATCHES_MESSAGE: &str = "I could not find relevant information to answer your query.";

/// User-facing notice when matches exist but carry no usable text.
pub const EMPTY_CONTEXT_MESSAGE: &str =
    "I found related documents, but couldn't extract usable context.";

/// System prompt template; `{CONTEXT}` is replaced with the assembled block.
const SYSTEM_PROMPT: &str = "\
You are a helpful assistant. Answer the user's query based *only* on the provided context.
If the context does not contain the information needed to answer the query, state that clearly.
Do not make up information. Be concise and directly address the query. Keep the answer suitable for being read aloud.

Rules:
- If the user's question asks about a specific person, you must **only respond** if the context explicitly contains that person.
- Do NOT guess or assume facts based on similar people.
- If the context doesn't mention that person, say: \"The context does not include information about [person].\"
- Never state facts about a person unless the context holds their information.

Context:
---
{CONTEXT}
---
";

/// How a stream run ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// Retrieval returned nothing; the notice was emitted.
    NoMatches,
    /// Matches carried no usable text; the notice was emitted.
    EmptyContext,
    /// Generation ran to completion (or the caller hung up mid-stream);
    /// `answer` is every chunk the caller received, concatenated.
    Completed { answer: String },
    /// A fatal error was emitted as an `Error` event.
    Failed,
}

/// Internal states, tracked for tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Started,
    Retrieving,
    Generating,
    Streaming,
    Terminal,
}

pub struct AnswerStreamer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl AnswerStreamer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    /// Drive one answer stream: lead-in, search, assemble, generate.
    ///
    /// Every path emits the lead-in first. Chunks already sent are never
    /// retracted; a mid-generation failure surfaces as an `Error` event
    /// after them. A closed receiver stops emission without failing.
    pub async fn run(
        &self,
        retriever: &Retriever,
        assembler: &ContextAssembler,
        final_query: &str,
        vector: Vec<f32>,
        tx: &mpsc::Sender<AnswerEvent>,
    ) -> StreamOutcome {
        let mut state = State::Started;
        debug!(state = ?state, "answer stream opened");
        if tx.send(AnswerEvent::LeadIn).await.is_err() {
            return StreamOutcome::Completed {
                answer: String::new(),
            };
        }

        state = State::Retrieving;
        debug!(state = ?state, "searching index");
        let matches = match retriever.search(vector).await {
            Ok(matches) => matches,
            Err(err) => {
                error!(error = %err, "index query failed mid-stream");
                let _ = tx
                    .send(AnswerEvent::Error {
                        message: "Failed to search the knowledge index.".into(),
                    })
                    .await;
                return StreamOutcome::Failed;
            }
        };

        if matches.is_empty() {
            state = State::Terminal;
            debug!(state = ?state, "no matches");
            let _ = tx.send(AnswerEvent::NoMatches).await;
            return StreamOutcome::NoMatches;
        }

        let context = match assembler.assemble(&matches) {
            AssembledContext::Ready(context) => context,
            AssembledContext::Empty => {
                state = State::Terminal;
                debug!(state = ?state, "matches carried no usable text");
                let _ = tx.send(AnswerEvent::EmptyContext).await;
                return StreamOutcome::EmptyContext;
            }
        };

        state = State::Generating;
        debug!(state = ?state, context_chars = context.len(), "opening generation stream");
        let filled_prompt = SYSTEM_PROMPT.replace("{CONTEXT}", &context);
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(filled_prompt),
                Message::user(final_query.to_string()),
            ],
            temperature: self.temperature,
            max_tokens: None,
            stream: true,
        };

        let mut chunks = match self.provider.stream(request).await {
            Ok(chunks) => chunks,
            Err(err) => {
                error!(error = %err, "provider refused the generation stream");
                let _ = tx
                    .send(AnswerEvent::Error {
                        message: "Failed to generate an answer.".into(),
                    })
                    .await;
                return StreamOutcome::Failed;
            }
        };

        state = State::Streaming;
        debug!(state = ?state, "streaming chunks");
        let generation_started = std::time::Instant::now();
        let mut answer = String::new();
        while let Some(chunk) = chunks.recv().await {
            match chunk {
                Ok(chunk) => {
                    if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                        // Accumulate only what the caller actually received, so
                        // the answer handed back equals the emitted chunks even
                        // when the receiver hangs up mid-stream.
                        let event = AnswerEvent::Chunk {
                            content: content.clone(),
                        };
                        if tx.send(event).await.is_err() {
                            debug!("receiver gone, stopping chunk emission");
                            break;
                        }
                        answer.push_str(&content);
                    }
                    if chunk.done {
                        break;
                    }
                }
                Err(err) => {
                    error!(error = %err, emitted = answer.len(), "generation stream broke");
                    let _ = tx
                        .send(AnswerEvent::Error {
                            message: "The answer stream was interrupted.".into(),
                        })
                        .await;
                    return StreamOutcome::Failed;
                }
            }
        }

        state = State::Terminal;
        debug!(
            state = ?state,
            answer_chars = answer.len(),
            elapsed_ms = generation_started.elapsed().as_millis() as u64,
            "generation complete"
        );
        StreamOutcome::Completed { answer }
    }
}
