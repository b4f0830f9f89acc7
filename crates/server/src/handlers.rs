use crate::{errors::AppError, state::AppState, types::AskRequest};
use axum::{extract::State, Json};
use receiptql::AskResponse;
use tracing::info;

/// The root handler.
pub async fn root() -> &'static str {
    "receiptql server is running."
}

/// The health check handler.
pub async fn health_check() -> &'static str {
    "OK"
}

/// The handler for the `/ask` endpoint.
///
/// Runs one question through the pipeline and returns the answer together
/// with the SQL and parameters that produced it.
pub async fn ask_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    info!("Received ask request: '{}'", payload.question);

    let response = app_state
        .orchestrator
        .ask(&payload.question)
        .await
        .map_err(|e| AppError::ask(e, app_state.config.ask.expose_error_details))?;

    Ok(Json(response))
}
