//! # Model Gateway Tests
//!
//! Exercises the HTTP providers against a `wiremock` server: the request shape
//! each one sends, how replies are decoded, and how failures are classified.

mod common;

use anyhow::Result;
use common::setup_tracing;
use receiptql::{
    create_provider,
    providers::ai::{ollama::OllamaProvider, openai::OpenAiCompatibleProvider, AiProvider},
    types::GenerationOptions,
    AskError, ProviderConfig, ProviderKind,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn options() -> GenerationOptions {
    GenerationOptions {
        temperature: 0.1,
        context_window: 8192,
    }
}

#[tokio::test]
async fn test_ollama_sends_generate_request_and_reads_response() -> Result<()> {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3",
            "system": "SYSTEM",
            "prompt": "USER",
            "stream": false,
            "options": {"num_ctx": 8192}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "response": "{\"text\": \"hello\"}",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    let provider = OllamaProvider::new(
        format!("{}/api/generate", server.uri()),
        "llama3".to_string(),
        Duration::from_secs(5),
    )?;

    // --- 2. Act ---
    let text = provider.generate("SYSTEM", "USER", &options()).await?;

    // --- 3. Assert ---
    assert_eq!(text, "{\"text\": \"hello\"}");
    Ok(())
}

#[tokio::test]
async fn test_openai_sends_chat_messages_with_bearer_token() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "stream": false,
            "messages": [
                {"role": "system", "content": "SYSTEM"},
                {"role": "user", "content": "USER"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "SELECT 1"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let provider = OpenAiCompatibleProvider::new(
        format!("{}/v1/chat/completions", server.uri()),
        Some("secret".to_string()),
        Some("gpt-4o-mini".to_string()),
        Duration::from_secs(5),
    )?;

    let text = provider.generate("SYSTEM", "USER", &options()).await?;

    assert_eq!(text, "SELECT 1");
    Ok(())
}

#[tokio::test]
async fn test_non_success_status_is_upstream_unavailable() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;
    let provider = create_provider(&ProviderConfig {
        kind: ProviderKind::Ollama,
        api_url: format!("{}/api/generate", server.uri()),
        api_key: None,
        model_name: "llama3".to_string(),
        timeout_secs: 5,
    })?;

    let err = provider.generate("SYSTEM", "USER", &options()).await.unwrap_err();

    match err {
        AskError::UpstreamUnavailable(reason) => assert!(reason.contains("500"), "{reason}"),
        other => panic!("expected UpstreamUnavailable, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_slow_gateway_times_out() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let provider = OllamaProvider::new(
        format!("{}/api/generate", server.uri()),
        "llama3".to_string(),
        Duration::from_millis(200),
    )?;

    let err = provider.generate("SYSTEM", "USER", &options()).await.unwrap_err();

    assert!(matches!(err, AskError::UpstreamUnavailable(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_gateway_is_upstream_unavailable() -> Result<()> {
    setup_tracing();
    // Nothing listens on port 9 in the test environment.
    let provider = OllamaProvider::new(
        "http://127.0.0.1:9/api/generate".to_string(),
        "llama3".to_string(),
        Duration::from_secs(2),
    )?;

    let err = provider.generate("SYSTEM", "USER", &options()).await.unwrap_err();

    assert!(matches!(err, AskError::UpstreamUnavailable(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn test_undecodable_body_is_malformed_output() -> Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;
    let provider = OllamaProvider::new(
        format!("{}/api/generate", server.uri()),
        "llama3".to_string(),
        Duration::from_secs(5),
    )?;

    let err = provider.generate("SYSTEM", "USER", &options()).await.unwrap_err();

    assert!(matches!(err, AskError::MalformedModelOutput(_)), "got {err:?}");
    Ok(())
}
