use anyhow::Result;
use async_trait::async_trait;
use receiptql::{
    errors::AskError,
    providers::{ai::AiProvider, db::storage::QueryExecutor},
    types::{BoundQuery, GenerationOptions, RowSet},
    SqliteExecutor,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// A substring unique to the SQL generation system prompt.
pub const SQL_PROMPT_KEY: &str = "SQLite analyst";
/// A substring unique to the narration system prompt.
pub const NARRATION_PROMPT_KEY: &str = "ONE short sentence";

/// Receipts fixture: three shops, three receipts, nine lines, six brands.
pub const RECEIPTS_FIXTURE: &str = r#"
    INSERT INTO organization (id, ico, name, country, municipality) VALUES (1, '35790164', 'BILLA s.r.o.', 'SK', 'Bratislava');
    INSERT INTO organization (id, ico, name, country, municipality) VALUES (2, '35793783', 'Lidl Slovenská republika', 'SK', 'Bratislava');
    INSERT INTO unit (id, org_id, name, country, municipality) VALUES (1, 1, 'Billa Obchodná', 'SK', 'Bratislava');
    INSERT INTO unit (id, org_id, name, country, municipality) VALUES (2, 2, 'Lidl Ružinov', 'SK', 'Bratislava');
    INSERT INTO unit (id, org_id, name, country, municipality) VALUES (3, 1, 'Billa Košice', 'SK', 'Košice');
    INSERT INTO "transaction" (id, issue_date, org_id, unit_id) VALUES (1, '2024-03-15T10:12:00', 1, 1);
    INSERT INTO "transaction" (id, issue_date, org_id, unit_id) VALUES (2, '2024-03-20T18:40:00', 2, 2);
    INSERT INTO "transaction" (id, issue_date, org_id, unit_id) VALUES (3, '2025-01-05T09:05:00', 1, 3);
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (1, 1, 1, 'Mlieko Rajo 1l', 1.19, 'mlieko', 'milk', 'Rajo', 'dairy');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (2, 1, 1, 'Jogurt Rajo', 0.89, 'jogurt', 'yogurt', 'Rajo', 'dairy');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (3, 1, 1, 'Tatranka', 0.59, 'oblátka', 'wafer', 'Sedita', 'sweets');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (4, 2, 1, 'Kofola 2l', 1.89, 'kofola', 'cola', 'Kofola', 'drinks');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (5, 2, 1, 'Rama 250g', 2.49, 'margarín', 'margarine', 'Rama', 'spreads');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (6, 2, 1, 'Figaro horká', 1.29, 'čokoláda', 'chocolate', 'Figaro', 'sweets');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (7, 3, 1, 'Mlieko Tatra', 1.09, 'mlieko', 'milk', 'Tatra', 'dairy');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (8, 3, 1, 'Kofola 2l', 1.89, 'kofola', 'cola', 'Kofola', 'drinks');
    INSERT INTO item (id, transaction_id, quantity, name, price, ai_name_without_brand_and_quantity, ai_name_in_english_without_brand_and_quantity, ai_brand, ai_category) VALUES (9, 3, 1, 'Chlieb', 1.50, 'chlieb', 'bread', NULL, 'bakery')
"#;

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub executor: SqliteExecutor,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database with the receipt tables.
    pub async fn new() -> Result<Self> {
        let executor = SqliteExecutor::new(":memory:").await?;
        executor.initialize_schema().await?;
        Ok(Self { executor })
    }

    /// Same as [`TestSetup::new`], with [`RECEIPTS_FIXTURE`] loaded.
    pub async fn with_receipts() -> Result<Self> {
        let setup = Self::new().await?;
        setup.executor.initialize_with_data(RECEIPTS_FIXTURE).await?;
        Ok(setup)
    }
}

/// Serializes a generation payload the way a well-behaved model would.
pub fn sql_reply(sql: &str, explanation: &str, params: Value) -> String {
    json!({"sql": sql, "explanation": explanation, "params": params}).to_string()
}

/// Serializes a narration reply.
pub fn narration_reply(text: &str) -> String {
    json!({ "text": text }).to_string()
}

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    responses: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-programs a response for a specific prompt.
    /// The key should be a unique substring of the system prompt.
    pub fn add_response(&self, key: &str, response: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(key.to_string(), response.to_string());
    }

    /// Retrieves the recorded `(system, user)` prompt pairs for assertion.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, AskError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((system_prompt.to_string(), user_prompt.to_string()));

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if system_prompt.contains(key) {
                return Ok(response.clone());
            }
        }

        Err(AskError::UpstreamUnavailable(
            "MockAiProvider: no response programmed for this system prompt".to_string(),
        ))
    }
}

// --- Canned Query Executor ---

/// Returns fixed rows (or a fixed engine error) and records every query.
#[derive(Clone, Debug, Default)]
pub struct CannedExecutor {
    rows: RowSet,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<BoundQuery>>>,
}

impl CannedExecutor {
    pub fn new(rows: RowSet) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// An executor whose every call fails with `ExecutionError(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn get_calls(&self) -> Vec<BoundQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for CannedExecutor {
    fn name(&self) -> &str {
        "Canned"
    }

    async fn execute(&self, query: &BoundQuery) -> Result<RowSet, AskError> {
        self.calls.lock().unwrap().push(query.clone());
        match &self.failure {
            Some(message) => Err(AskError::ExecutionError(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}
