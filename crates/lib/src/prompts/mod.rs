//! # Prompt Construction
//!
//! Builds the two prompts the pipeline sends to the model: the SQL generation
//! prompt (rules, schema, examples, question) and the compact narration prompt
//! (locale, question, intent hint, row preview). Both builders are pure.

pub mod core;
pub mod narration;

use crate::types::{Row, SqlPayload};
use regex::{Captures, Regex};
use serde_json::json;
use std::sync::LazyLock;

static NARRATION_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(locale|question|intent_hint|rows)\}").expect("slot pattern is valid")
});

/// The static texts both prompts are assembled from.
#[derive(Debug, Clone)]
pub struct PromptTexts {
    pub sql_system: String,
    pub sql_user_template: String,
    pub payload_json_schema: String,
    pub schema_documentation: String,
    pub examples: String,
    pub narration_system: String,
    pub narration_user_template: String,
}

impl Default for PromptTexts {
    fn default() -> Self {
        Self {
            sql_system: core::SQL_SYSTEM_PROMPT.to_string(),
            sql_user_template: core::SQL_USER_PROMPT.to_string(),
            payload_json_schema: core::SQL_PAYLOAD_JSON_SCHEMA.to_string(),
            schema_documentation: core::SCHEMA_DOCUMENTATION.to_string(),
            examples: core::FEW_SHOT_EXAMPLES.to_string(),
            narration_system: narration::NARRATION_SYSTEM_PROMPT.to_string(),
            narration_user_template: narration::NARRATION_USER_PROMPT.to_string(),
        }
    }
}

/// Builds the user prompt for SQL generation.
///
/// The question is substituted last so that text inside it is never treated
/// as a template placeholder.
pub fn build_sql_prompt(texts: &PromptTexts, allowed_tables: &[String], question: &str) -> String {
    texts
        .sql_user_template
        .replace("{allowed_tables}", &allowed_tables.join(", "))
        .replace("{json_schema}", &texts.payload_json_schema)
        .replace("{examples}", &texts.examples)
        .replace("{schema}", &texts.schema_documentation)
        .replace("{question}", question.trim())
}

/// Inputs for [`build_narration_prompt`].
pub struct NarrationInput<'a> {
    pub question: &'a str,
    pub payload: &'a SqlPayload,
    pub rows: &'a [Row],
    pub locale: &'a str,
    pub preview_rows: usize,
    pub sql_head_chars: usize,
}

/// Builds the user prompt for narration.
///
/// Only the explanation and a bounded prefix of the SQL are included, along
/// with the first `preview_rows` rows serialized compactly.
pub fn build_narration_prompt(template: &str, input: &NarrationInput<'_>) -> String {
    let sql_head: String = input.payload.sql.chars().take(input.sql_head_chars).collect();
    let intent_hint = json!({
        "explanation": input.payload.explanation,
        "sql_head": sql_head,
    });
    let preview = &input.rows[..input.rows.len().min(input.preview_rows)];
    let rows_json = serde_json::to_string(preview).unwrap_or_else(|_| "[]".to_string());

    let intent_hint = intent_hint.to_string();

    // One pass, so slot names inside substituted values stay literal.
    NARRATION_SLOT
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "locale" => input.locale.to_string(),
            "question" => input.question.to_string(),
            "intent_hint" => intent_hint.clone(),
            _ => rows_json.clone(),
        })
        .into_owned()
}
