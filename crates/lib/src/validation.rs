//! # SQL Payload Validation
//!
//! The safety gate between model output and the query executor. A payload is
//! accepted only if all three checks hold:
//!
//! 1. **Shape**: exactly `sql`, `explanation` and `params`, with the expected types.
//! 2. **Statement kind and tokens**: the SQL starts with `SELECT` and contains no
//!    statement separator, comment marker or denied keyword.
//! 3. **Tables**: every `FROM`/`JOIN` target is on the allow-list, and there is at least one.
//!
//! Table references are found by a token scan that knows SQLite's identifier
//! quoting (`"x"`, `[x]`, `` `x` ``), parenthesised sources and comma joins.
//! It is still not a parser. It narrows what reaches the database but it is
//! not a complete defense against adversarial SQL; the executor should also
//! run with a read-only role.

use crate::{
    constants::{ALLOWED_TABLES, DENIED_KEYWORDS, DENIED_SYMBOLS},
    errors::AskError,
    types::SqlPayload,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

const REQUIRED_KEYS: [&str; 3] = ["sql", "explanation", "params"];

static PARAM_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$[1-9][0-9]*$").expect("param key pattern is valid"));

/// Functions whose argument syntax uses `FROM` without naming a table.
const FROM_TAKING_FUNCTIONS: &[&str] = &["extract", "substring", "trim", "overlay", "position"];

/// Keywords that end the table list of a `FROM` clause.
const CLAUSE_KEYWORDS: &[&str] = &[
    "select", "where", "group", "having", "order", "limit", "offset", "union", "except",
    "intersect", "window", "values",
];

/// The allow-list and deny-list, compiled once and shared.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    allowed_tables: BTreeSet<String>,
    deny: Regex,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::new(&ALLOWED_TABLES, DENIED_KEYWORDS).expect("built-in safety patterns are valid")
    }
}

impl SafetyPolicy {
    /// Builds a policy from table names and denied keywords. Separators and
    /// comment markers are always denied.
    pub fn new(allowed_tables: &[&str], denied_keywords: &[&str]) -> Result<Self, AskError> {
        let symbols = DENIED_SYMBOLS
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let keywords = denied_keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let deny = Regex::new(&format!(r"(?i)({symbols}|\b({keywords})\b)"))?;

        Ok(Self {
            allowed_tables: allowed_tables.iter().map(|t| t.to_lowercase()).collect(),
            deny,
        })
    }

    pub fn allowed_tables(&self) -> Vec<String> {
        self.allowed_tables.iter().cloned().collect()
    }

    /// Runs all checks and returns the typed payload on success.
    pub fn validate(&self, payload: &Map<String, Value>) -> Result<SqlPayload, AskError> {
        let payload = check_shape(payload)?;
        self.check_statement(&payload.sql)?;
        self.check_tables(&payload.sql)?;
        debug!(sql = %payload.sql, "Payload passed validation");
        Ok(payload)
    }

    /// SELECT-only, and no denied token anywhere in the raw SQL.
    pub fn check_statement(&self, sql: &str) -> Result<(), AskError> {
        let head = sql.trim_start().to_lowercase();
        if !head.starts_with("select") {
            let first_word = head.split_whitespace().next().unwrap_or_default();
            return Err(AskError::StatementKind(first_word.to_uppercase()));
        }

        let mut found: Vec<String> = Vec::new();
        for m in self.deny.find_iter(sql) {
            let token = m.as_str().to_uppercase();
            if !found.contains(&token) {
                found.push(token);
            }
        }
        if !found.is_empty() {
            warn!(tokens = ?found, "Rejected SQL with forbidden tokens");
            return Err(AskError::ForbiddenToken(found.join(", ")));
        }
        Ok(())
    }

    /// Every referenced table must be allowed, and there must be at least one.
    pub fn check_tables(&self, sql: &str) -> Result<(), AskError> {
        let tables = extract_tables(sql);
        if tables.is_empty() {
            return Err(AskError::NoTableReference);
        }
        let illegal: Vec<String> = tables
            .difference(&self.allowed_tables)
            .cloned()
            .collect();
        if !illegal.is_empty() {
            warn!(tables = ?illegal, "Rejected SQL referencing disallowed tables");
            return Err(AskError::DisallowedTable(illegal));
        }
        Ok(())
    }
}

/// Checks keys and value types, then converts to [`SqlPayload`].
fn check_shape(payload: &Map<String, Value>) -> Result<SqlPayload, AskError> {
    for key in REQUIRED_KEYS {
        if !payload.contains_key(key) {
            return Err(AskError::schema(key, "missing required key"));
        }
    }
    if let Some(extra) = payload.keys().find(|k| !REQUIRED_KEYS.contains(&k.as_str())) {
        return Err(AskError::schema(extra, "unexpected key"));
    }

    let sql = match &payload["sql"] {
        Value::String(s) if !s.trim().is_empty() => s.clone(),
        Value::String(_) => return Err(AskError::schema("sql", "must not be empty")),
        other => return Err(AskError::schema("sql", type_error("string", other))),
    };
    let explanation = match &payload["explanation"] {
        Value::String(s) => s.clone(),
        other => return Err(AskError::schema("explanation", type_error("string", other))),
    };
    let params = match &payload["params"] {
        Value::Object(map) => map.clone(),
        other => return Err(AskError::schema("params", type_error("object", other))),
    };
    for (key, value) in &params {
        if !PARAM_KEY.is_match(key) {
            return Err(AskError::schema(
                "params",
                format!("key {key:?} is not of the form $<positive integer>"),
            ));
        }
        if value.is_array() || value.is_object() {
            return Err(AskError::schema(
                "params",
                format!("value for {key} must be a scalar"),
            ));
        }
    }

    Ok(SqlPayload {
        sql,
        explanation,
        params,
    })
}

fn type_error(expected: &str, got: &Value) -> String {
    let actual = match got {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("expected {expected}, got {actual}")
}

/// Blanks out the contents of single-quoted literals so words inside them are
/// not mistaken for table references or placeholders. Byte offsets are kept,
/// so matches in the result index the original text.
pub(crate) fn mask_string_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_literal = false;
    for c in sql.chars() {
        if c == '\'' {
            in_literal = !in_literal;
            out.push(c);
        } else if in_literal {
            out.push_str(&" ".repeat(c.len_utf8()));
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Unquoted identifier or keyword, lowercased.
    Word(String),
    /// `"x"`, `[x]` or `` `x` ``, lowercased. Never a keyword.
    Quoted(String),
    Open,
    Close,
    Comma,
    Dot,
    Other,
}

fn tokenize(sql: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '(' => Token::Open,
            ')' => Token::Close,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '"' | '[' | '`' => {
                let close = if c == '[' { ']' } else { c };
                let name: String = chars.by_ref().take_while(|n| *n != close).collect();
                Token::Quoted(name.to_lowercase())
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = c.to_string();
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' || n == '$' {
                        word.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Word(word.to_lowercase())
            }
            _ => Token::Other,
        };
        tokens.push(token);
    }
    tokens
}

/// Scan state for one parenthesis level.
#[derive(Default)]
struct Level {
    /// Inside the source list of a `FROM` clause.
    in_from: bool,
    /// The next identifier names a table.
    expect_table: bool,
    /// Function whose call these parentheses belong to.
    call: Option<String>,
}

/// Collects lowercase table names from `FROM` lists and `JOIN` sources,
/// including parenthesised and comma-joined ones. Only the last segment of a
/// qualified name counts and quotes are stripped.
pub fn extract_tables(sql: &str) -> BTreeSet<String> {
    let tokens = tokenize(&mask_string_literals(sql));
    let mut tables = BTreeSet::new();
    let mut levels = vec![Level::default()];
    // Most recent table name and its token index, for `schema.table`.
    let mut last_table: Option<(String, usize)> = None;

    for (i, token) in tokens.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| &tokens[p]);
        let Some(level) = levels.last_mut() else {
            break;
        };
        match token {
            Token::Word(w) if w == "from" => {
                let exempt = matches!(prev, Some(Token::Word(p)) if p == "distinct")
                    || level
                        .call
                        .as_deref()
                        .is_some_and(|f| FROM_TAKING_FUNCTIONS.contains(&f));
                if !exempt {
                    level.in_from = true;
                    level.expect_table = true;
                }
            }
            Token::Word(w) if w == "join" => {
                level.in_from = true;
                level.expect_table = true;
            }
            Token::Word(w) if w == "on" || w == "using" => level.expect_table = false,
            Token::Word(w) if CLAUSE_KEYWORDS.contains(&w.as_str()) => {
                level.in_from = false;
                level.expect_table = false;
            }
            Token::Word(name) | Token::Quoted(name) => {
                if level.expect_table {
                    tables.insert(name.clone());
                    last_table = Some((name.clone(), i));
                    level.expect_table = false;
                } else if let Some((qualifier, at)) = last_table.take() {
                    if at + 2 == i && matches!(prev, Some(Token::Dot)) {
                        // The segment after the dot replaces the schema name.
                        tables.remove(&qualifier);
                        tables.insert(name.clone());
                        last_table = Some((name.clone(), i));
                    }
                }
            }
            Token::Comma if level.in_from => level.expect_table = true,
            Token::Open => {
                let call = match prev {
                    Some(Token::Word(w)) => Some(w.clone()),
                    _ => None,
                };
                let source = level.expect_table;
                level.expect_table = false;
                levels.push(Level {
                    in_from: source,
                    expect_table: source,
                    call,
                });
            }
            Token::Close => {
                if levels.len() > 1 {
                    levels.pop();
                }
            }
            _ => {}
        }
    }
    tables
}
