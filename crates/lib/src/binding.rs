//! # Parameter Binding
//!
//! Turns the model's `{"$1": .., "$2": ..}` map into positional arguments and
//! rewrites `$N` placeholders into the engine's numbered `?N` marker.
//!
//! The model is not reliable about placeholders: it may inline literals and
//! still send params, number them with gaps, or already use `?`. The binder
//! reconciles these cases instead of trusting the generation step.

use crate::{errors::AskError, types::BoundQuery, validation::mask_string_literals};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::{debug, warn};

static DOLLAR_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("placeholder pattern is valid"));

static NATIVE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?\d*").expect("native marker pattern is valid"));

/// What to do when params and placeholders disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindPolicy {
    /// Drop parameters the SQL does not reference.
    #[default]
    Lenient,
    /// Refuse the query with [`AskError::PlaceholderMismatch`].
    Strict,
}

fn placeholder_number(key: &str) -> Result<u32, AskError> {
    key.strip_prefix('$')
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| AskError::PlaceholderMismatch(format!("invalid placeholder name {key:?}")))
}

/// Parameter values ordered by their numeric suffix.
pub fn ordered_params(params: &Map<String, Value>) -> Result<BTreeMap<u32, Value>, AskError> {
    params
        .iter()
        .map(|(k, v)| Ok((placeholder_number(k)?, v.clone())))
        .collect()
}

/// Binds `params` to `sql` under `policy`.
pub fn bind(sql: &str, params: &Map<String, Value>, policy: BindPolicy) -> Result<BoundQuery, AskError> {
    let ordered = ordered_params(params)?;
    // Placeholder syntax inside a string literal is text, not a marker.
    let masked = mask_string_literals(sql);

    let referenced: BTreeSet<u32> = DOLLAR_PLACEHOLDER
        .captures_iter(&masked)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .collect();
    let has_native = NATIVE_PLACEHOLDER.is_match(&masked);

    if referenced.is_empty() {
        if has_native {
            debug!("SQL already uses native placeholders; passing params through");
            return Ok(BoundQuery {
                sql: sql.to_string(),
                args: ordered.into_values().collect(),
            });
        }
        if !ordered.is_empty() {
            if policy == BindPolicy::Strict {
                return Err(AskError::PlaceholderMismatch(format!(
                    "{} params supplied but the SQL has no placeholders",
                    ordered.len()
                )));
            }
            warn!(
                count = ordered.len(),
                "Params supplied but no placeholders in SQL; assuming inlined values and dropping them"
            );
        }
        return Ok(BoundQuery {
            sql: sql.to_string(),
            args: Vec::new(),
        });
    }

    if let Some(missing) = referenced.iter().find(|n| !ordered.contains_key(*n)) {
        return Err(AskError::PlaceholderMismatch(format!(
            "SQL references ${missing} but no value was supplied"
        )));
    }
    let unused: Vec<u32> = ordered
        .keys()
        .filter(|n| !referenced.contains(*n))
        .copied()
        .collect();
    if !unused.is_empty() {
        if policy == BindPolicy::Strict {
            return Err(AskError::PlaceholderMismatch(format!(
                "params {unused:?} are not referenced by the SQL"
            )));
        }
        warn!(?unused, "Dropping params not referenced by the SQL");
    }

    // Rank by ascending N so gaps like $1, $3 bind to positions 1, 2.
    let positions: BTreeMap<u32, usize> = referenced
        .iter()
        .enumerate()
        .map(|(i, n)| (*n, i + 1))
        .collect();
    // Offsets in `masked` match `sql`, so literals are copied through untouched.
    let mut rewritten = String::with_capacity(sql.len());
    let mut copied = 0;
    for caps in DOLLAR_PLACEHOLDER.captures_iter(&masked) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let position = digits
            .as_str()
            .parse::<u32>()
            .ok()
            .and_then(|n| positions.get(&n));
        if let Some(pos) = position {
            rewritten.push_str(&sql[copied..whole.start()]);
            rewritten.push_str(&format!("?{pos}"));
            copied = whole.end();
        }
    }
    rewritten.push_str(&sql[copied..]);
    let args = referenced
        .iter()
        .filter_map(|n| ordered.get(n).cloned())
        .collect();

    Ok(BoundQuery {
        sql: rewritten,
        args,
    })
}
