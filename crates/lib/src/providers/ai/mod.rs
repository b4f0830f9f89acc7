pub mod ollama;
pub mod openai;

use crate::{errors::AskError, types::GenerationOptions};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a generative model.
///
/// Both pipeline stages (SQL generation and narration) go through this
/// interface, so tests can substitute a scripted implementation.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Sends a system and user prompt and returns the model's raw text.
    ///
    /// Implementations must bound the call with a timeout and report
    /// unreachable hosts, timeouts and non-success statuses as
    /// [`AskError::UpstreamUnavailable`]. No retries happen at this layer.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, AskError>;
}

dyn_clone::clone_trait_object!(AiProvider);

/// Maps a transport failure from `reqwest` onto the pipeline's error taxonomy.
pub(crate) fn upstream_error(provider: &str, err: reqwest::Error) -> AskError {
    let reason = if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    AskError::UpstreamUnavailable(format!("{provider}: {reason}"))
}
