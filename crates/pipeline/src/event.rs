//! Events emitted over the answer stream.
//!
//! The pipeline communicates with its caller through a channel of
//! `AnswerEvent`s. Transports decide how to render them: the HTTP gateway
//! flattens text-bearing events into a plain-text body, the CLI prints
//! them to stdout.

use serde::{Deserialize, Serialize};

/// One event on the answer stream.
///
/// Ordering is fixed: `LeadIn` first, then either a terminal notice
/// (`NoMatches` / `EmptyContext`), or zero or more `Chunk`s followed by
/// `Done`. `Error` may replace any suffix of that sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerEvent {
    /// The fixed reply prefix, emitted before retrieval begins.
    LeadIn,

    /// A partial answer text delta from the model.
    Chunk { content: String },

    /// Retrieval returned no matches; the stream ends after this.
    NoMatches,

    /// Matches existed but none carried usable text; the stream ends
    /// after this.
    EmptyContext,

    /// Generation finished. `answer` is the concatenation of every
    /// `Chunk` emitted before it.
    Done {
        answer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved_entity: Option<String>,
    },

    /// Something went wrong mid-stream. Chunks already emitted stand.
    Error { message: String },
}

impl AnswerEvent {
    /// Stable name for logging and serialized transport.
    pub fn event_type(&self) -> &'static str {
        match self {
            AnswerEvent::LeadIn => "lead_in",
            AnswerEvent::Chunk { .. } => "chunk",
            AnswerEvent::NoMatches => "no_matches",
            AnswerEvent::EmptyContext => "empty_context",
            AnswerEvent::Done { .. } => "done",
            AnswerEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnswerEvent::NoMatches
                | AnswerEvent::EmptyContext
                | AnswerEvent::Done { .. }
                | AnswerEvent::Error { .. }
        )
    }
}
