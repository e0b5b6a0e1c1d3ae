//! Provider construction from configuration.
//!
//! This service talks to a single OpenAI-compatible backend; the builder
//! turns the validated config into a shared `Provider` handle.

use crate::openai_compat::OpenAiCompatProvider;
use ragline_core::error::ProviderError;
use ragline_core::provider::Provider;
use std::sync::Arc;

/// Build the configured provider.
///
/// Fails when no API key is available — the pipeline cannot embed or
/// generate without one.
pub fn build_from_config(
    config: &ragline_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .provider
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("No provider API key configured".into()))?;

    let provider = OpenAiCompatProvider::new("openai", &config.provider.api_url, api_key)?;
    Ok(Arc::new(provider))
}
