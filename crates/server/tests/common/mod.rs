//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port, backed by a temporary
//! SQLite file with the receipts fixture and an `httpmock::MockServer`
//! standing in for the Ollama `/api/generate` endpoint.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use httpmock::{Method::POST, Mock, MockServer};
use receiptql::{
    create_provider, AskOrchestrator, ProviderConfig, ProviderKind, SqliteExecutor,
};
use receiptql_server::{
    config::{AppConfig, AskSettings},
    router,
    state::AppState,
};
use receiptql_test_utils::RECEIPTS_FIXTURE;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use tempfile::NamedTempFile;
use tokio::{net::TcpListener, task::JoinHandle};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Marker unique to the SQL generation prompt.
pub const SQL_PROMPT_MARKER: &str = "SCHEMA (documentation)";
/// Marker unique to the narration prompt.
pub const NARRATION_PROMPT_MARKER: &str = "INTENT_HINT";

/// A provider config pointing at the mock Ollama endpoint.
pub fn ollama_config(mock_server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        kind: ProviderKind::Ollama,
        api_url: mock_server.url("/api/generate"),
        api_key: None,
        model_name: "mock-model".to_string(),
        timeout_secs: 5,
    }
}

/// An `AppConfig` for the given database path and mock server.
pub fn app_config(db_url: &str, mock_server: &MockServer, expose_error_details: bool) -> AppConfig {
    AppConfig {
        port: 0,
        db_url: db_url.to_string(),
        provider: ollama_config(mock_server),
        ask: AskSettings {
            expose_error_details,
            ..Default::default()
        },
    }
}

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    _db_file: NamedTempFile,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the server with error details hidden from clients.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(false).await
    }

    pub async fn spawn_with(expose_error_details: bool) -> Result<Self> {
        setup_tracing();
        let mock_server = MockServer::start();
        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_string_lossy().to_string();

        let executor = SqliteExecutor::new(&db_path).await?;
        executor.initialize_schema().await?;
        executor.initialize_with_data(RECEIPTS_FIXTURE).await?;

        let config = app_config(&db_path, &mock_server, expose_error_details);
        let orchestrator = AskOrchestrator::builder()
            .ai_provider(create_provider(&config.provider)?)
            .query_executor(Box::new(executor))
            .config(Arc::new(config.ask.to_ask_config()))
            .build()?;
        let app_state = AppState {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = format!("http://{}", listener.local_addr()?);
        let app = router::create_router(app_state);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        // Give the server a moment to start up.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            _db_file: db_file,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Scripts the SQL generation reply.
    pub fn mock_sql_reply(&self, reply: &str) -> Mock<'_> {
        self.mock_server.mock(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains(SQL_PROMPT_MARKER);
            then.status(200).json_body(json!({ "response": reply }));
        })
    }

    /// Scripts the narration reply.
    pub fn mock_narration_reply(&self, reply: &str) -> Mock<'_> {
        self.mock_server.mock(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains(NARRATION_PROMPT_MARKER);
            then.status(200).json_body(json!({ "response": reply }));
        })
    }

    /// Matches any generate call; used to prove the model was never called.
    pub fn mock_any_generate(&self) -> Mock<'_> {
        self.mock_server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({ "response": "{}" }));
        })
    }

    /// Posts a question to `/ask`.
    pub async fn ask(&self, question: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}/ask", self.address))
            .json(&json!({ "question": question }))
            .send()
            .await?)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Reads a JSON body.
pub async fn json_body(response: reqwest::Response) -> Result<Value> {
    Ok(response.json::<Value>().await?)
}
