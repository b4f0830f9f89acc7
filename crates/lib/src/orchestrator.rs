//! # The Ask Orchestrator
//!
//! `AskOrchestrator` is the single entry point for answering a question. It
//! holds the model gateway, the query executor and the read-only
//! [`AskConfig`], and runs one question through every stage in order. Any
//! failure ends the request at the stage where it happened; nothing after a
//! rejection runs, in particular no SQL reaches the executor.

use crate::{
    binding::bind,
    errors::AskError,
    extract::extract_json_object,
    prompts::build_sql_prompt,
    providers::{ai::AiProvider, db::storage::QueryExecutor},
    synthesis::ResponseSynthesizer,
    types::{AskConfig, AskResponse, PipelineStage},
};
use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Replaces every parameter value equal to `sentinel` with `today` as an
/// ISO-8601 date. Returns how many values were replaced.
pub fn substitute_date_sentinels(
    params: &mut Map<String, Value>,
    sentinel: &str,
    today: NaiveDate,
) -> usize {
    let today = today.format("%Y-%m-%d").to_string();
    let mut replaced = 0;
    for (key, value) in params.iter_mut() {
        if value.as_str() == Some(sentinel) {
            warn!(param = %key, date = %today, "Replacing date sentinel with today's date");
            *value = Value::String(today.clone());
            replaced += 1;
        }
    }
    replaced
}

/// Answers natural-language questions about receipts.
///
/// Cloning is cheap and clones share the same configuration.
#[derive(Clone, Debug)]
pub struct AskOrchestrator {
    ai_provider: Box<dyn AiProvider>,
    query_executor: Box<dyn QueryExecutor>,
    config: Arc<AskConfig>,
}

/// A builder for creating `AskOrchestrator` instances.
#[derive(Default)]
pub struct AskOrchestratorBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    query_executor: Option<Box<dyn QueryExecutor>>,
    config: Option<Arc<AskConfig>>,
}

impl AskOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model gateway used for both SQL generation and narration.
    pub fn ai_provider(mut self, provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    pub fn query_executor(mut self, executor: Box<dyn QueryExecutor>) -> Self {
        self.query_executor = Some(executor);
        self
    }

    /// Overrides the default configuration.
    pub fn config(mut self, config: Arc<AskConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `AskOrchestrator`.
    ///
    /// Fails if either the AI provider or the query executor is missing.
    pub fn build(self) -> Result<AskOrchestrator, AskError> {
        Ok(AskOrchestrator {
            ai_provider: self.ai_provider.ok_or(AskError::MissingAiProvider)?,
            query_executor: self
                .query_executor
                .ok_or(AskError::MissingQueryExecutor)?,
            config: self.config.unwrap_or_default(),
        })
    }
}

impl AskOrchestrator {
    pub fn builder() -> AskOrchestratorBuilder {
        AskOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &AskConfig {
        &self.config
    }

    /// Answers one question, using the local clock for date sentinels.
    pub async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
        self.ask_on(question, Local::now().date_naive()).await
    }

    /// Answers one question as if it were asked on `today`.
    pub async fn ask_on(&self, question: &str, today: NaiveDate) -> Result<AskResponse, AskError> {
        let span = info_span!("ask", request_id = %Uuid::new_v4());
        async move {
            let mut stage = PipelineStage::Received;
            let result = self.run(question, today, &mut stage).await;
            match &result {
                Ok(response) => info!(
                    stage = %stage,
                    locale = %response.locale,
                    rows = response.rows_count,
                    "Question answered"
                ),
                Err(e) => warn!(stage = %stage, kind = ?e.kind(), error = %e, "Question failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        question: &str,
        today: NaiveDate,
        stage: &mut PipelineStage,
    ) -> Result<AskResponse, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }
        info!(question = %question, "Received question");
        let config = self.config.as_ref();

        let locale = config.locales.classify(question).to_string();
        advance(stage, PipelineStage::LocaleResolved);

        let prompt = build_sql_prompt(&config.prompts, &config.safety.allowed_tables(), question);
        debug!(user_prompt = %prompt, "--> Sending SQL prompt to AI Provider");
        let raw = self
            .ai_provider
            .generate(&config.prompts.sql_system, &prompt, &config.sql_generation)
            .await?;
        debug!(raw = %raw, "<-- SQL payload from AI");
        let object = extract_json_object(&raw)?;
        advance(stage, PipelineStage::SqlGenerated);

        let mut payload = config.safety.validate(&object)?;
        advance(stage, PipelineStage::Validated);

        substitute_date_sentinels(&mut payload.params, &config.date_sentinel, today);
        let bound = bind(&payload.sql, &payload.params, config.bind_policy)?;
        advance(stage, PipelineStage::Bound);

        let executor = self.query_executor.name();
        debug!(executor, args = bound.args.len(), "Executing bound query");
        let rows = match self.query_executor.execute(&bound).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(
                    executor,
                    question = %question,
                    sql = %bound.sql,
                    args = ?bound.args,
                    error = %e,
                    "Query execution failed"
                );
                return Err(e);
            }
        };
        advance(stage, PipelineStage::Executed);

        let answer = ResponseSynthesizer::new(&*self.ai_provider, config)
            .synthesize(question, &payload, &rows, &locale)
            .await;
        advance(stage, PipelineStage::Synthesized);

        let response = AskResponse {
            answer,
            sql: payload.sql,
            params: payload.params,
            locale,
            rows_count: rows.len(),
        };
        advance(stage, PipelineStage::Answered);
        Ok(response)
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    info!(from = %stage, to = %next, "Pipeline stage transition");
    *stage = next;
}
