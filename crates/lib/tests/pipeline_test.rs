//! # Ask Pipeline Tests
//!
//! End-to-end runs of `AskOrchestrator::ask` with a scripted model. The happy
//! paths run against the in-memory receipts fixture; the rejection paths use a
//! canned executor so the tests can assert that nothing reached it.

mod common;

use anyhow::Result;
use chrono::NaiveDate;
use common::{orchestrator, setup_tracing};
use receiptql::{AskConfig, AskError, AskOrchestrator, BindPolicy, ErrorKind};
use receiptql_test_utils::{
    narration_reply, sql_reply, CannedExecutor, MockAiProvider, TestSetup, NARRATION_PROMPT_KEY,
    SQL_PROMPT_KEY,
};
use serde_json::json;
use std::sync::Arc;

const TOP_BRANDS_SQL: &str = r#"SELECT i.ai_brand AS ai_brand, SUM(i.price) AS total_spent FROM item i JOIN "transaction" t ON i.transaction_id = t.id WHERE i.ai_brand IS NOT NULL GROUP BY i.ai_brand ORDER BY total_spent DESC LIMIT 5"#;

#[tokio::test]
async fn test_top_brands_end_to_end() -> Result<()> {
    // --- 1. Arrange ---
    setup_tracing();
    let setup = TestSetup::with_receipts().await?;
    let ai = MockAiProvider::new();
    ai.add_response(
        SQL_PROMPT_KEY,
        &sql_reply(TOP_BRANDS_SQL, "Brands ranked by total spend.", json!({})),
    );
    ai.add_response(
        NARRATION_PROMPT_KEY,
        &narration_reply("Kofola leads your brand spending."),
    );
    let orchestrator = orchestrator(&ai, Box::new(setup.executor.clone()));

    // --- 2. Act ---
    let response = orchestrator.ask("Top 5 brands by spend").await?;

    // --- 3. Assert ---
    assert_eq!(response.rows_count, 5);
    assert_eq!(response.locale, "en");
    assert_eq!(response.sql, TOP_BRANDS_SQL);
    let lines: Vec<&str> = response.answer.lines().collect();
    assert_eq!(lines.len(), 6, "headline plus five list lines: {}", response.answer);
    assert_eq!(lines[0], "Kofola leads your brand spending.");
    assert_eq!(lines[1], "1) Kofola — €3.78");
    assert_eq!(lines[2], "2) Rama — €2.49");
    assert_eq!(lines[3], "3) Rajo — €2.08");
    assert!(lines[5].starts_with("5) "));

    let calls = ai.get_calls();
    assert_eq!(calls.len(), 2, "one generation call and one narration call");
    assert!(calls[0].1.contains("SCHEMA (documentation):"));
    assert!(calls[0].1.ends_with("Top 5 brands by spend"));
    assert!(calls[1].1.contains("LOCALE: en"));
    assert!(calls[1].1.contains("INTENT_HINT"));
    Ok(())
}

#[tokio::test]
async fn test_slovak_question_with_bound_params() -> Result<()> {
    // --- 1. Arrange ---
    setup_tracing();
    let setup = TestSetup::with_receipts().await?;
    let ai = MockAiProvider::new();
    ai.add_response(
        SQL_PROMPT_KEY,
        &sql_reply(
            "SELECT SUM(i.price) AS total_spent FROM item i WHERE LOWER(i.ai_name_in_english_without_brand_and_quantity) LIKE LOWER($1)",
            "Total spent on milk.",
            json!({"$1": "%milk%"}),
        ),
    );
    // The narration model answers in prose, so the fallback phrase is used.
    ai.add_response(NARRATION_PROMPT_KEY, "Spolu ste minuli 2,28 €.");
    let orchestrator = orchestrator(&ai, Box::new(setup.executor.clone()));

    // --- 2. Act ---
    let response = orchestrator.ask("Koľko som minul za mlieko?").await?;

    // --- 3. Assert ---
    assert_eq!(response.locale, "sk");
    assert_eq!(response.rows_count, 1);
    assert_eq!(response.answer, "Zhrnutie je pripravené.");
    assert_eq!(response.params, json!({"$1": "%milk%"}).as_object().cloned().unwrap());
    Ok(())
}

#[tokio::test]
async fn test_zero_rows_uses_no_data_phrase() -> Result<()> {
    setup_tracing();
    let setup = TestSetup::with_receipts().await?;
    let ai = MockAiProvider::new();
    ai.add_response(
        SQL_PROMPT_KEY,
        &sql_reply(
            "SELECT i.name, i.price FROM item i WHERE i.ai_brand = $1",
            "Items of a brand.",
            json!({"$1": "Nonexistent"}),
        ),
    );
    ai.add_response(NARRATION_PROMPT_KEY, "not json at all");
    let orchestrator = orchestrator(&ai, Box::new(setup.executor.clone()));

    let response = orchestrator.ask("What did I buy from Nonexistent?").await?;

    assert_eq!(response.rows_count, 0);
    assert_eq!(response.answer, "No matching data was found.");
    Ok(())
}

#[tokio::test]
async fn test_date_sentinel_is_replaced_before_execution() -> Result<()> {
    setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_response(
        SQL_PROMPT_KEY,
        &sql_reply(
            r#"SELECT COUNT(*) AS count FROM "transaction" t WHERE date(t.issue_date) = $1"#,
            "Receipts issued today.",
            json!({"$1": "specified_date"}),
        ),
    );
    ai.add_response(NARRATION_PROMPT_KEY, &narration_reply("You have no receipts today."));
    let executor = CannedExecutor::new(vec![json!({"count": 0}).as_object().cloned().unwrap()]);
    let orchestrator = orchestrator(&ai, Box::new(executor.clone()));
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    let response = orchestrator.ask_on("How many receipts do I have today?", today).await?;

    assert_eq!(response.params["$1"], json!("2025-06-01"));
    let calls = executor.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args, vec![json!("2025-06-01")]);
    assert!(calls[0].sql.ends_with("= ?1"));
    assert_eq!(response.answer, "You have no receipts today.");
    Ok(())
}

#[tokio::test]
async fn test_rejected_payloads_never_reach_the_executor() -> Result<()> {
    setup_tracing();
    let cases = [
        (
            sql_reply("DELETE FROM item", "x", json!({})),
            ErrorKind::Rejected,
        ),
        (
            sql_reply("SELECT * FROM item; DROP TABLE item", "x", json!({})),
            ErrorKind::Rejected,
        ),
        (
            sql_reply("SELECT * FROM users JOIN secrets s ON 1 = 1", "x", json!({})),
            ErrorKind::Rejected,
        ),
        (
            sql_reply("SELECT * FROM item JOIN [secrets] ON 1 = 1", "x", json!({})),
            ErrorKind::Rejected,
        ),
        (
            sql_reply("SELECT * FROM item, `secrets`", "x", json!({})),
            ErrorKind::Rejected,
        ),
        (
            sql_reply("SELECT * FROM item JOIN (secrets) ON 1 = 1", "x", json!({})),
            ErrorKind::Rejected,
        ),
        (
            json!({"sql": "SELECT * FROM item", "params": {}}).to_string(),
            ErrorKind::Rejected,
        ),
        (
            "I am sorry, I cannot help with that.".to_string(),
            ErrorKind::Internal,
        ),
    ];

    for (reply, expected_kind) in cases {
        let ai = MockAiProvider::new();
        ai.add_response(SQL_PROMPT_KEY, &reply);
        let executor = CannedExecutor::default();
        let orchestrator = orchestrator(&ai, Box::new(executor.clone()));

        let err = orchestrator
            .ask("Show me everything")
            .await
            .expect_err("payload must be refused");

        assert_eq!(err.kind(), expected_kind, "reply {reply:?} gave {err}");
        assert!(executor.get_calls().is_empty(), "executor was called for {reply:?}");
        assert_eq!(ai.get_calls().len(), 1, "no narration after a failure");
    }
    Ok(())
}

#[tokio::test]
async fn test_disallowed_tables_are_all_named() -> Result<()> {
    setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_response(
        SQL_PROMPT_KEY,
        &sql_reply(
            "SELECT * FROM item i JOIN users u ON 1 = 1 JOIN secrets s ON 1 = 1",
            "x",
            json!({}),
        ),
    );
    let orchestrator = orchestrator(&ai, Box::new(CannedExecutor::default()));

    let err = orchestrator.ask("Who are the users?").await.unwrap_err();

    match err {
        AskError::DisallowedTable(tables) => assert_eq!(tables, vec!["secrets", "users"]),
        other => panic!("expected DisallowedTable, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_question_is_refused_before_any_call() -> Result<()> {
    let ai = MockAiProvider::new();
    let orchestrator = orchestrator(&ai, Box::new(CannedExecutor::default()));

    let err = orchestrator.ask("   ").await.unwrap_err();

    assert!(matches!(err, AskError::EmptyQuestion));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(ai.get_calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_model_outage_is_unavailable() -> Result<()> {
    // No responses programmed: every call fails like an unreachable gateway.
    let ai = MockAiProvider::new();
    let orchestrator = orchestrator(&ai, Box::new(CannedExecutor::default()));

    let err = orchestrator.ask("Top 5 brands by spend").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
    Ok(())
}

#[tokio::test]
async fn test_execution_errors_propagate() -> Result<()> {
    setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_response(
        SQL_PROMPT_KEY,
        &sql_reply("SELECT missing_column FROM item", "x", json!({})),
    );
    let setup = TestSetup::with_receipts().await?;
    let orchestrator = orchestrator(&ai, Box::new(setup.executor.clone()));

    let err = orchestrator.ask("Show the missing column").await.unwrap_err();

    assert!(matches!(err, AskError::ExecutionError(_)), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Internal);
    Ok(())
}

#[tokio::test]
async fn test_strict_binding_refuses_inlined_values() -> Result<()> {
    setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_response(
        SQL_PROMPT_KEY,
        &sql_reply(
            "SELECT i.name FROM item i WHERE i.ai_brand = 'Rajo'",
            "Rajo items.",
            json!({"$1": "Rajo"}),
        ),
    );
    ai.add_response(NARRATION_PROMPT_KEY, &narration_reply("You bought two Rajo items."));
    let executor = CannedExecutor::default();

    let strict = AskOrchestrator::builder()
        .ai_provider(Box::new(ai.clone()))
        .query_executor(Box::new(executor.clone()))
        .config(Arc::new(AskConfig {
            bind_policy: BindPolicy::Strict,
            ..AskConfig::default()
        }))
        .build()?;
    let err = strict.ask("What Rajo items did I buy?").await.unwrap_err();
    assert!(matches!(err, AskError::PlaceholderMismatch(_)));
    assert!(executor.get_calls().is_empty());

    // The default lenient policy drops the unused value and runs the query.
    let lenient = orchestrator(&ai, Box::new(executor.clone()));
    let response = lenient.ask("What Rajo items did I buy?").await?;
    assert_eq!(response.rows_count, 0);
    assert_eq!(executor.get_calls()[0].args, Vec::<serde_json::Value>::new());
    Ok(())
}
