//! # AI Provider Factory
//!
//! Builds the model gateway named in configuration. Keeping this in the `lib`
//! crate lets the server and the tests construct providers the same way.

use crate::{
    errors::AskError,
    providers::ai::{ollama::OllamaProvider, openai::OpenAiCompatibleProvider, AiProvider},
    types::{ProviderConfig, ProviderKind},
};
use std::time::Duration;
use tracing::info;

/// Creates the AI provider described by `config`.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn AiProvider>, AskError> {
    if config.api_url.trim().is_empty() {
        return Err(AskError::UnsupportedProvider(format!(
            "{:?} provider requires a non-empty api_url",
            config.kind
        )));
    }
    let timeout = Duration::from_secs(config.timeout_secs);

    info!(
        kind = ?config.kind,
        api_url = %config.api_url,
        model = %config.model_name,
        "Configuring AI provider"
    );

    let provider: Box<dyn AiProvider> = match config.kind {
        ProviderKind::Ollama => Box::new(OllamaProvider::new(
            config.api_url.clone(),
            config.model_name.clone(),
            timeout,
        )?),
        ProviderKind::Openai => Box::new(OpenAiCompatibleProvider::new(
            config.api_url.clone(),
            config.api_key.clone().filter(|k| !k.is_empty()),
            Some(config.model_name.clone()).filter(|m| !m.is_empty()),
            timeout,
        )?),
    };
    Ok(provider)
}
