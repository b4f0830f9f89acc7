//! # Response Synthesis
//!
//! The final answer has two tiers: a one-sentence headline written by the
//! narration model, and, for multi-row results, a numbered list rendered
//! straight from the rows. Every figure in the list comes from the database,
//! never from the model.

use crate::{
    constants::LIST_ROW_LIMIT,
    extract::extract_json_object,
    prompts::{build_narration_prompt, NarrationInput},
    providers::ai::AiProvider,
    types::{AskConfig, Row, SqlPayload},
};
use serde_json::Value;
use tracing::{debug, warn};

/// Column preferences for the deterministic list.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// String columns tried in order for the row label.
    pub label_preference: Vec<String>,
    /// Numeric columns tried in order for the row value.
    pub value_preference: Vec<String>,
    /// A value column whose name contains one of these is formatted as money.
    pub money_markers: Vec<String>,
    pub currency_symbol: String,
    pub list_limit: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            label_preference: strings(&[
                "ai_brand",
                "ai_name_in_english_without_brand_and_quantity",
                "ai_category",
                "name",
                "org_name",
                "unit_name",
            ]),
            value_preference: strings(&[
                "total_spent",
                "sum",
                "total",
                "amount",
                "price",
                "count",
                "cnt",
            ]),
            money_markers: strings(&["price", "spent", "total", "sum", "amount"]),
            currency_symbol: "€".to_string(),
            list_limit: LIST_ROW_LIMIT,
        }
    }
}

/// Picks the first preferred key whose value satisfies `accept`, else the
/// first key in column order that does.
fn pick_column<'a>(
    sample: &'a Row,
    preference: &'a [String],
    accept: fn(&Value) -> bool,
) -> Option<&'a str> {
    preference
        .iter()
        .find(|key| sample.get(key.as_str()).is_some_and(accept))
        .or_else(|| sample.iter().find(|(_, v)| accept(v)).map(|(k, _)| k))
        .map(String::as_str)
}

/// `1234.5` -> `1,234.50`.
fn group_thousands(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Renders up to `options.list_limit` rows as `i) label — value` lines.
///
/// Returns an empty string for an empty row set.
pub fn render_rows_as_list(rows: &[Row], options: &RenderOptions) -> String {
    let rows = &rows[..rows.len().min(options.list_limit)];
    let Some(sample) = rows.first() else {
        return String::new();
    };

    let label_key = pick_column(sample, &options.label_preference, Value::is_string);
    let value_key = pick_column(sample, &options.value_preference, Value::is_number);
    let is_money = value_key.is_some_and(|key| {
        let key = key.to_lowercase();
        options.money_markers.iter().any(|m| key.contains(m.as_str()))
    });

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let n = i + 1;
            let label = label_key
                .and_then(|k| row.get(k))
                .and_then(display_value)
                .filter(|l| !l.is_empty());
            let value = value_key.and_then(|k| row.get(k)).and_then(|v| match v {
                Value::Number(num) if is_money => num
                    .as_f64()
                    .map(|f| format!("{}{}", options.currency_symbol, group_thousands(f))),
                other => display_value(other),
            });

            match (label, value) {
                (Some(label), Some(value)) => format!("{n}) {label} — {value}"),
                (Some(label), None) => format!("{n}) {label}"),
                _ => {
                    let full_row = row
                        .iter()
                        .map(|(k, v)| format!("{k}={}", display_value(v).unwrap_or_else(|| "null".into())))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{n}) {full_row}")
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins the headline and, for more than one row, the rendered list.
pub fn compose_final_text(headline: &str, rows: &[Row], options: &RenderOptions) -> String {
    let headline = headline.trim();
    if rows.len() <= 1 {
        return headline.to_string();
    }
    let list = render_rows_as_list(rows, options);
    match (headline.is_empty(), list.is_empty()) {
        (_, true) => headline.to_string(),
        (true, false) => list,
        (false, false) => format!("{headline}\n{list}"),
    }
}

/// Produces the final answer text for one executed query.
pub struct ResponseSynthesizer<'a> {
    provider: &'a dyn AiProvider,
    config: &'a AskConfig,
}

impl<'a> ResponseSynthesizer<'a> {
    pub fn new(provider: &'a dyn AiProvider, config: &'a AskConfig) -> Self {
        Self { provider, config }
    }

    /// Asks the narration model for a headline. Any failure, from transport to
    /// a reply without a string `text`, yields the locale's fixed phrase.
    async fn headline(&self, question: &str, payload: &SqlPayload, rows: &[Row], locale: &str) -> String {
        let prompt = build_narration_prompt(
            &self.config.prompts.narration_user_template,
            &NarrationInput {
                question,
                payload,
                rows,
                locale,
                preview_rows: self.config.narration_preview_rows,
                sql_head_chars: self.config.narration_sql_head_chars,
            },
        );
        debug!(prompt = %prompt, "--> Sending narration prompt to AI Provider");

        let narrated = match self
            .provider
            .generate(&self.config.prompts.narration_system, &prompt, &self.config.narration)
            .await
        {
            Ok(raw) => {
                debug!(raw = %raw, "<-- Narration from AI");
                extract_json_object(&raw)
                    .ok()
                    .and_then(|object| object.get("text").and_then(Value::as_str).map(str::to_string))
            }
            Err(e) => {
                warn!(error = %e, "Narration call failed; using fallback phrase");
                None
            }
        };

        narrated.unwrap_or_else(|| {
            if rows.is_empty() {
                self.config.locales.no_data(locale)
            } else {
                self.config.locales.summary_ready(locale)
            }
        })
    }

    /// Builds the final answer: headline, plus the list for multi-row results.
    pub async fn synthesize(&self, question: &str, payload: &SqlPayload, rows: &[Row], locale: &str) -> String {
        let headline = self.headline(question, payload, rows, locale).await;
        let text = compose_final_text(&headline, rows, &self.config.render);
        if !text.is_empty() {
            return text;
        }
        if rows.is_empty() {
            self.config.locales.no_data(locale)
        } else {
            render_rows_as_list(rows, &self.config.render)
        }
    }
}
