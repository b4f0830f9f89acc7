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

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

// --- Provider implementation ---

/// A provider for hosted or local servers exposing the OpenAI chat-completions API.
///
/// The context window is fixed server-side for these APIs, so only the
/// temperature from [`GenerationOptions`] is forwarded.
#[derive(Clone, Debug)]
pub struct OpenAiCompatibleProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Creates a new `OpenAiCompatibleProvider` whose calls give up after `timeout`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AskError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(AskError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiCompatibleProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AskError> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ];

        let request_body = ChatRequest {
            messages,
            model: self.model.as_deref(),
            temperature: options.temperature,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);

        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(|e| upstream_error("openai", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AskError::UpstreamUnavailable(format!(
                "openai: status {status}: {error_text}"
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AskError::MalformedModelOutput(format!("openai: {e}")))?;

        let raw_response = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!(chars = raw_response.len(), "<-- Response from OpenAI-compatible provider");
        Ok(raw_response)
    }
}
