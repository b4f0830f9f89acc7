//! # Application State
//!
//! The shared state (`AppState`) and the logic for building it at startup:
//! the model gateway, the receipts database and the pipeline configuration
//! are all resolved once here and shared by every request.

use crate::config::AppConfig;
use receiptql::{create_provider, AskOrchestrator, SqliteExecutor};
use std::{path::Path, sync::Arc};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<AskOrchestrator>,
}

/// Builds the shared application state from the configuration.
///
/// Opens (and if needed creates) the receipts database and ensures its schema.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let ai_provider = create_provider(&config.provider)?;

    if let Some(parent) = Path::new(&config.db_url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let executor = SqliteExecutor::new(&config.db_url).await?;
    executor.initialize_schema().await?;
    info!(db_path = %config.db_url, "Initialized receipts storage (SQLite).");

    let orchestrator = AskOrchestrator::builder()
        .ai_provider(ai_provider)
        .query_executor(Box::new(executor))
        .config(Arc::new(config.ask.to_ask_config()))
        .build()?;

    Ok(AppState {
        config: Arc::new(config),
        orchestrator: Arc::new(orchestrator),
    })
}
