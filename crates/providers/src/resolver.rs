//! Model-backed implementation of the `Resolver` capability.
//!
//! Wraps any `Provider` and issues a single low-temperature completion for
//! disambiguation calls. The router owns prompt construction and reply
//! parsing; this type is just the transport.

use async_trait::async_trait;
use ragline_core::error::ResolverError;
use ragline_core::message::Message;
use ragline_core::provider::{Provider, ProviderRequest};
use ragline_core::resolver::Resolver;
use std::sync::Arc;
use tracing::debug;

/// Resolver backed by a chat-completion provider.
pub struct ModelResolver {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ModelResolver {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Resolver for ModelResolver {
    async fn resolve(
        &self,
        instructions: &str,
        input: &str,
    ) -> std::result::Result<String, ResolverError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(instructions), Message::user(input)],
            temperature: 0.0,
            max_tokens: Some(256),
            stream: false,
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ResolverError::CallFailed(e.to_string()))?;

        debug!(model = %self.model, reply_len = response.message.content.len(), "Resolver reply");
        Ok(response.message.content)
    }
}
