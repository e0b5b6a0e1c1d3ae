//! # Ragline Core
//!
//! Domain types, traits, and error definitions for the Ragline
//! retrieval-augmented answer pipeline. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the LLM backend
//! (`Provider`), the vector index (`VectorIndex`), the disambiguation
//! capability (`Resolver`), and the conversational store
//! (`ConversationStore`). Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod index;
pub mod memory;
pub mod message;
pub mod provider;
pub mod resolver;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use index::{IndexQuery, RetrievalMatch, VectorIndex};
pub use memory::{ConversationStore, MemoryRecord, UserId};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use resolver::{Resolver, RouterDecision};
