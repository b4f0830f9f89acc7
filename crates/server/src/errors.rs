use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use receiptql::{AskError, ErrorKind};
use serde_json::json;
use tracing::error;

/// The error returned by the server's handlers.
///
/// Wraps a pipeline error so it can be converted into an HTTP response.
/// `expose_details` decides whether the reason reaches the client or only the log.
pub struct AppError {
    error: AskError,
    expose_details: bool,
}

impl AppError {
    pub fn ask(error: AskError, expose_details: bool) -> Self {
        AppError {
            error,
            expose_details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError {
            error,
            expose_details,
        } = self;
        // Log the original error for debugging purposes
        error!("AskError: {:?}", error);

        let (status_code, generic) = match error.kind() {
            ErrorKind::BadRequest => (StatusCode::BAD_REQUEST, None),
            ErrorKind::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Some("The model or the database is temporarily unavailable."),
            ),
            ErrorKind::Rejected => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Some("The generated query was rejected by the safety checks."),
            ),
            ErrorKind::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("An internal server error occurred."),
            ),
        };
        let error_message = match generic {
            Some(generic) if !expose_details => generic.to_string(),
            _ => error.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
