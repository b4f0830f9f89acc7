//! # Structured Output Extraction
//!
//! Model replies are not guaranteed to be clean JSON. Extraction runs an
//! ordered list of strategies over the reply; the first one that yields a
//! JSON object wins, and exhausting the list is an explicit error.

use crate::errors::AskError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence pattern is valid")
});

type Strategy = fn(&str) -> Option<&str>;

/// Strategies in the order they are tried.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("bare", bare_object),
    ("fenced", fenced_object),
    ("outer_braces", outer_braces),
];

/// The whole trimmed reply is bracketed by `{` ... `}`.
fn bare_object(text: &str) -> Option<&str> {
    (text.starts_with('{') && text.ends_with('}')).then_some(text)
}

/// A triple-backtick block, optionally tagged `json`, holding one object.
fn fenced_object(text: &str) -> Option<&str> {
    FENCED_OBJECT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Everything from the first `{` to the last `}`.
fn outer_braces(text: &str) -> Option<&str> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    (first < last).then(|| &text[first..=last])
}

/// Recovers a single JSON object from arbitrary model text.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, AskError> {
    let text = text.trim();
    for (name, strategy) in STRATEGIES {
        let Some(candidate) = strategy(text) else {
            continue;
        };
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => {
                debug!(strategy = name, "Extracted JSON object from model output");
                return Ok(object);
            }
            Ok(_) => debug!(strategy = name, "Candidate parsed but is not an object"),
            Err(e) => debug!(strategy = name, error = %e, "Candidate is not valid JSON"),
        }
    }

    let preview: String = text.chars().take(120).collect();
    Err(AskError::MalformedModelOutput(format!(
        "cannot find a valid JSON object in: {preview:?}"
    )))
}
