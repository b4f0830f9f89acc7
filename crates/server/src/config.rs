//! # Application Configuration
//!
//! This module defines the configuration structure for the `receiptql-server`
//! and loads it from a YAML file and environment variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use receiptql::{constants::DEFAULT_DB_FILE, AskConfig, BindPolicy, ProviderConfig};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::sync::LazyLock;
use tracing::info;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").expect("placeholder pattern is valid")
});

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite receipts database. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// The model gateway used for both SQL generation and narration.
    pub provider: ProviderConfig,
    #[serde(default)]
    pub ask: AskSettings,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

/// Per-deployment overrides of the pipeline defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AskSettings {
    #[serde(default)]
    pub sql_temperature: Option<f32>,
    #[serde(default)]
    pub narration_temperature: Option<f32>,
    /// Applied to both model calls.
    #[serde(default)]
    pub context_window: Option<u32>,
    #[serde(default)]
    pub bind_policy: Option<BindPolicy>,
    #[serde(default)]
    pub currency_symbol: Option<String>,
    /// Include rejection and failure reasons in error responses. Keep off in production.
    #[serde(default)]
    pub expose_error_details: bool,
}

impl AskSettings {
    /// The library defaults with these overrides applied.
    pub fn to_ask_config(&self) -> AskConfig {
        let mut ask = AskConfig::default();
        if let Some(temperature) = self.sql_temperature {
            ask.sql_generation.temperature = temperature;
        }
        if let Some(temperature) = self.narration_temperature {
            ask.narration.temperature = temperature;
        }
        if let Some(window) = self.context_window {
            ask.sql_generation.context_window = window;
            ask.narration.context_window = window;
        }
        if let Some(policy) = self.bind_policy {
            ask.bind_policy = policy;
        }
        if let Some(symbol) = &self.currency_symbol {
            ask.render.currency_symbol = symbol.clone();
        }
        ask
    }
}

// Reads a file and substitutes `${VAR}` from the environment.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let expanded_content = ENV_PLACEHOLDER.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// Without an explicit path, `config.yml` next to the crate manifest is used,
/// falling back to `config.{AI_PROVIDER}.yml` (default `ollama`).
/// - Top-level keys like `port` and `db_url` are overridden by `PORT` and `DB_URL`.
/// - Nested keys are overridden by `RECEIPTQL_...` variables (e.g., `RECEIPTQL_PROVIDER__MODEL_NAME`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");

    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "ollama".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?.ok_or_else(|| {
        ConfigError::NotFound(format!(
            "Main config file not found at '{main_config_path}'. Please create 'config.yml' or set AI_PROVIDER to 'ollama' or 'openai'."
        ))
    })?;

    let settings = ConfigBuilder::builder()
        .add_source(File::from_str(&main_content, FileFormat::Yaml))
        // Top-level keys like PORT and DB_URL.
        .add_source(Environment::default())
        // Prefixed variables for nested keys.
        .add_source(
            Environment::with_prefix("RECEIPTQL")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
