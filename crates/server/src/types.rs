use serde::Deserialize;

/// The request body for the `/ask` endpoint.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}
