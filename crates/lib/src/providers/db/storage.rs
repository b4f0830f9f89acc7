use crate::{
    errors::AskError,
    types::{BoundQuery, RowSet},
};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// The boundary to the receipts data store.
///
/// Implementations only ever receive SQL that has passed the safety gate and
/// the binder. They return rows in the column order of the query.
#[async_trait]
pub trait QueryExecutor: Send + Sync + DynClone + Debug {
    /// Returns the name of the backing engine (e.g., "SQLite").
    fn name(&self) -> &str;

    /// Runs `query` and collects every row it yields.
    async fn execute(&self, query: &BoundQuery) -> Result<RowSet, AskError>;
}

dyn_clone::clone_trait_object!(QueryExecutor);
