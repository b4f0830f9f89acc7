use crate::{
    binding::BindPolicy,
    constants::{DATE_SENTINEL, NARRATION_PREVIEW_ROWS, NARRATION_SQL_HEAD_CHARS},
    locale::LocaleRules,
    prompts::PromptTexts,
    synthesis::RenderOptions,
    validation::SafetyPolicy,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One result row: column name to value, in the column order of the query.
pub type Row = Map<String, Value>;

/// The rows returned by the query executor. Empty means "no data".
pub type RowSet = Vec<Row>;

/// The validated output of the SQL generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlPayload {
    pub sql: String,
    pub explanation: String,
    /// Placeholder name (`$1`, `$2`, ...) to value.
    pub params: Map<String, Value>,
}

/// SQL with placeholders rewritten to the engine's native marker, plus the
/// values in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

/// The result of answering one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sql: String,
    pub params: Map<String, Value>,
    pub locale: String,
    pub rows_count: usize,
}

/// Sampling options passed with every model call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub context_window: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            context_window: 8192,
        }
    }
}

/// The wire protocol spoken by a model gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `POST /api/generate` with a single `response` field.
    Ollama,
    /// `POST /v1/chat/completions` with `choices[0].message.content`.
    Openai,
}

/// Connection settings for a model gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
    /// Upper bound for a single model call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    600
}

/// The stages a question moves through. Any failure ends the request at the
/// stage where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    LocaleResolved,
    SqlGenerated,
    Validated,
    Bound,
    Executed,
    Synthesized,
    Answered,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::LocaleResolved => "locale_resolved",
            PipelineStage::SqlGenerated => "sql_generated",
            PipelineStage::Validated => "validated",
            PipelineStage::Bound => "bound",
            PipelineStage::Executed => "executed",
            PipelineStage::Synthesized => "synthesized",
            PipelineStage::Answered => "answered",
        };
        f.write_str(name)
    }
}

/// Read-only configuration for the whole pipeline, built once at startup and
/// shared by every request.
#[derive(Debug, Clone)]
pub struct AskConfig {
    pub prompts: PromptTexts,
    pub safety: SafetyPolicy,
    pub locales: LocaleRules,
    pub render: RenderOptions,
    pub bind_policy: BindPolicy,
    pub sql_generation: GenerationOptions,
    pub narration: GenerationOptions,
    pub narration_preview_rows: usize,
    pub narration_sql_head_chars: usize,
    /// Parameter values equal to this are replaced with today's date.
    pub date_sentinel: String,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            prompts: PromptTexts::default(),
            safety: SafetyPolicy::default(),
            locales: LocaleRules::default(),
            render: RenderOptions::default(),
            bind_policy: BindPolicy::default(),
            sql_generation: GenerationOptions::default(),
            narration: GenerationOptions::default(),
            narration_preview_rows: NARRATION_PREVIEW_ROWS,
            narration_sql_head_chars: NARRATION_SQL_HEAD_CHARS,
            date_sentinel: DATE_SENTINEL.to_string(),
        }
    }
}
