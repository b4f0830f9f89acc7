#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Tracing setup plus small builders shared by the integration tests. The
//! scripted model and executor live in `receiptql-test-utils`.

use dotenvy::dotenv;
use receiptql::{AskOrchestrator, QueryExecutor};
use receiptql_test_utils::MockAiProvider;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

/// An orchestrator over the given collaborators with the default configuration.
pub fn orchestrator(ai: &MockAiProvider, executor: Box<dyn QueryExecutor>) -> AskOrchestrator {
    AskOrchestrator::builder()
        .ai_provider(Box::new(ai.clone()))
        .query_executor(executor)
        .build()
        .expect("both collaborators are set")
}
