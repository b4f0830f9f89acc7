use crate::{
    errors::AskError,
    providers::db::storage::QueryExecutor,
    types::{BoundQuery, Row, RowSet},
};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{self, Debug};
use tracing::{debug, info};
use turso::{Connection, Database, Value as TursoValue};

mod sql;

/// Executes bound queries against a local SQLite database using Turso.
///
/// Cloning shares the underlying `Database`, so every clone sees the same file
/// or in-memory instance. A connection is opened per query and dropped when
/// the query finishes, successfully or not.
#[derive(Clone)]
pub struct SqliteExecutor {
    pub db: Database,
}

impl SqliteExecutor {
    /// Opens the database at `db_path`. Use `":memory:"` for an isolated
    /// in-memory database; clone the executor to share it.
    pub async fn new(db_path: &str) -> Result<Self, AskError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| AskError::StorageConnection(e.to_string()))?;

        let executor = Self { db };
        let conn = executor.connect()?;
        // PRAGMA returns a row, so it goes through `query` rather than `execute`.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| AskError::StorageConnection(e.to_string()))?;

        info!(db_path, "Opened SQLite database");
        Ok(executor)
    }

    fn connect(&self) -> Result<Connection, AskError> {
        self.db
            .connect()
            .map_err(|e| AskError::StorageConnection(e.to_string()))
    }

    /// Runs `;`-separated statements, e.g. a test fixture.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), AskError> {
        let conn = self.connect()?;
        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| AskError::ExecutionError(e.to_string()))?;
        }
        Ok(())
    }

    /// Creates the receipt tables and their indexes. Idempotent.
    pub async fn initialize_schema(&self) -> Result<(), AskError> {
        let conn = self.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| AskError::ExecutionError(e.to_string()))?;
        }
        Ok(())
    }
}

impl Debug for SqliteExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteExecutor").finish_non_exhaustive()
    }
}

/// Converts a Turso value to a serde_json::Value.
fn turso_value_to_json(v: TursoValue) -> Value {
    match v {
        TursoValue::Null => Value::Null,
        TursoValue::Integer(i) => Value::Number(i.into()),
        TursoValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TursoValue::Text(s) => Value::String(s),
        TursoValue::Blob(_) => Value::String("<blob>".to_string()),
    }
}

/// Converts a bound argument to a Turso value. Booleans become 0/1 as SQLite
/// has no boolean type.
fn json_to_turso_value(v: &Value) -> TursoValue {
    match v {
        Value::Null => TursoValue::Null,
        Value::Bool(b) => TursoValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => TursoValue::Integer(i),
            None => TursoValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => TursoValue::Text(s.clone()),
        other => TursoValue::Text(other.to_string()),
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn name(&self) -> &str {
        "SQLite"
    }

    async fn execute(&self, query: &BoundQuery) -> Result<RowSet, AskError> {
        debug!(sql = %query.sql, args = ?query.args, "--> Executing SQLite query");
        let conn = self.connect()?;

        let mut stmt = conn
            .prepare(&query.sql)
            .await
            .map_err(|e| AskError::ExecutionError(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let args: Vec<TursoValue> = query.args.iter().map(json_to_turso_value).collect();
        let mut rows = stmt
            .query(args)
            .await
            .map_err(|e| AskError::ExecutionError(e.to_string()))?;

        let mut results: RowSet = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AskError::ExecutionError(e.to_string()))?
        {
            let mut row_map = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = row
                    .get_value(i)
                    .map_err(|e| AskError::ExecutionError(e.to_string()))?;
                row_map.insert(name.clone(), turso_value_to_json(value));
            }
            results.push(row_map);
        }

        debug!(rows = results.len(), "<-- SQLite query finished");
        Ok(results)
    }
}
