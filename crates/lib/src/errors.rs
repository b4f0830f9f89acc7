use thiserror::Error;

/// Coarse classification of an [`AskError`], used by callers to choose a
/// transport-level status without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model gateway or the data store could not be reached in time.
    Unavailable,
    /// The generated payload was refused by the safety gate or the binder.
    Rejected,
    /// The inbound request itself was unusable.
    BadRequest,
    /// Everything else: malformed model output, engine failures, bugs.
    Internal,
}

/// Custom error types for the ask pipeline.
#[derive(Error, Debug)]
pub enum AskError {
    #[error("Question cannot be empty.")]
    EmptyQuestion,
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Model output did not contain a usable JSON object: {0}")]
    MalformedModelOutput(String),
    #[error("Invalid payload field '{field}': {reason}")]
    SchemaViolation { field: String, reason: String },
    #[error("Only SELECT queries are allowed, got: {0}")]
    StatementKind(String),
    #[error("Forbidden SQL token found: {0}")]
    ForbiddenToken(String),
    #[error("No table references (FROM/JOIN) found in SQL.")]
    NoTableReference,
    #[error("Query uses disallowed tables: {}", .0.join(", "))]
    DisallowedTable(Vec<String>),
    #[error("Placeholder mismatch: {0}")]
    PlaceholderMismatch(String),
    #[error("Query execution failed: {0}")]
    ExecutionError(String),
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("AI provider is missing")]
    MissingAiProvider,
    #[error("Query executor is missing")]
    MissingQueryExecutor,
    #[error("Unsupported AI provider kind: {0}")]
    UnsupportedProvider(String),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl AskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AskError::EmptyQuestion => ErrorKind::BadRequest,
            AskError::UpstreamUnavailable(_) | AskError::StorageConnection(_) => {
                ErrorKind::Unavailable
            }
            AskError::SchemaViolation { .. }
            | AskError::StatementKind(_)
            | AskError::ForbiddenToken(_)
            | AskError::NoTableReference
            | AskError::DisallowedTable(_)
            | AskError::PlaceholderMismatch(_) => ErrorKind::Rejected,
            _ => ErrorKind::Internal,
        }
    }

    pub(crate) fn schema(field: &str, reason: impl Into<String>) -> Self {
        AskError::SchemaViolation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
