//! # Shared Constants
//!
//! Fixed values shared by the pipeline components and the server. Anything a
//! deployment may want to tune lives in [`crate::types::AskConfig`] instead,
//! which uses these as its defaults.

/// The only tables generated SQL may read from.
pub const ALLOWED_TABLES: [&str; 4] = ["item", "transaction", "unit", "organization"];

/// Keywords that mutate data or schema, or touch session and security settings.
/// The last four are SQLite-specific and are refused for the same reason.
pub const DENIED_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "CREATE", "ALTER", "DROP", "GRANT", "REVOKE", "SET", "SHOW",
    "COPY", "CALL", "DO", "TRUNCATE", "SECURITY", "POLICY", "PRAGMA", "ATTACH", "DETACH", "VACUUM",
];

/// Statement separator and comment markers.
pub const DENIED_SYMBOLS: &[&str] = &[";", "--", "/*"];

/// The value a model sometimes emits instead of an actual date.
pub const DATE_SENTINEL: &str = "specified_date";

/// The locale used when no rule matches.
pub const DEFAULT_LOCALE: &str = "en";

/// How many rows are shown to the narration model.
pub const NARRATION_PREVIEW_ROWS: usize = 5;

/// How many characters of the generated SQL are shown to the narration model.
pub const NARRATION_SQL_HEAD_CHARS: usize = 200;

/// How many rows the deterministic list renders.
pub const LIST_ROW_LIMIT: usize = 10;

/// The default path for the SQLite receipts database.
pub const DEFAULT_DB_FILE: &str = "db/receipts.db";
