//! LLM provider implementations for Ragline.
//!
//! All providers implement the `ragline_core::Provider` trait.
//! The builder constructs the configured provider at startup.

pub mod builder;
pub mod openai_compat;
pub mod resolver;

pub use builder::build_from_config;
pub use openai_compat::OpenAiCompatProvider;
pub use resolver::ModelResolver;
