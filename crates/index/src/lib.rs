//! Vector index backends for Ragline.
//!
//! Two implementations of `ragline_core::VectorIndex`:
//! - `RemoteIndex` — Pinecone-style HTTP index service
//! - `InMemoryIndex` — cosine-similarity search over in-process records,
//!   for tests and self-contained demos

pub mod in_memory;
pub mod remote;
pub mod vector;

pub use in_memory::{InMemoryIndex, IndexedRecord};
pub use remote::RemoteIndex;
pub use vector::cosine_similarity;
