//! # Receipt Questions to SQL
//!
//! This crate answers natural-language questions about shopping receipts. A
//! question is turned into a SQL payload by a generative model, checked by a
//! safety gate, bound and executed against the receipts store, and finally
//! narrated back in the user's language with a deterministic list of the rows.
//!
//! The entry point is [`AskOrchestrator`]; see [`AskConfig`] for everything
//! that can be tuned.

pub mod binding;
pub mod constants;
pub mod errors;
pub mod extract;
pub mod locale;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod synthesis;
pub mod types;
pub mod validation;

pub use binding::BindPolicy;
pub use errors::{AskError, ErrorKind};
pub use orchestrator::{AskOrchestrator, AskOrchestratorBuilder};
pub use providers::{
    ai::AiProvider,
    db::{sqlite::SqliteExecutor, storage::QueryExecutor},
    factory::create_provider,
};
pub use types::{AskConfig, AskResponse, BoundQuery, ProviderConfig, ProviderKind, Row, RowSet, SqlPayload};
