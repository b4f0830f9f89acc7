use crate::{
    errors::AskError,
    providers::ai::{upstream_error, AiProvider},
    types::GenerationOptions,
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;

// --- Ollama-specific request and response structures ---

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    options: GenerateOptions,
    stream: bool,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    /// Ollama's name for the context window.
    num_ctx: u32,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    response: String,
}

// --- Ollama Provider implementation ---

/// A provider for the Ollama `/api/generate` endpoint.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: ReqwestClient,
    api_url: String,
    model: String,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider`.
    ///
    /// `api_url` is the full endpoint, e.g. `http://localhost:11434/api/generate`.
    pub fn new(api_url: String, model: String, timeout: Duration) -> Result<Self, AskError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(AskError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            model,
        })
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AskError> {
        let request_body = GenerateRequest {
            model: &self.model,
            prompt: user_prompt,
            system: system_prompt,
            options: GenerateOptions {
                temperature: options.temperature,
                num_ctx: options.context_window,
            },
            stream: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| upstream_error("ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AskError::UpstreamUnavailable(format!(
                "ollama: status {status}: {error_text}"
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AskError::MalformedModelOutput(format!("ollama: {e}")))?;

        debug!(chars = body.response.len(), "<-- Response from Ollama");
        Ok(body.response)
    }
}
