//! # Orchestrator Tests
//!
//! End-to-end runs of `answer_user_query` against a real in-memory
//! knowledge base: the grounded FAQ path, every fallback path, the
//! log-everything invariant, and degradation when the generation
//! capability misbehaves.

mod common;

use crate::common::setup_tracing;
use porseman::agent::AnswerAgent;
use porseman::handlers::GREETING_REPLY;
use porseman::providers::db::sqlite::SqliteProvider;
use porseman::types::{AgentConfig, AnswerSource, Intent};
use porseman_test_utils::{SlowAiProvider, TestSetup};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const PRICE_QUESTION: &str = "قیمت محصولات چقدر است؟";
const SEEDED_QUESTION: &str = "هزینه محصولات چقدره؟";
const SEEDED_ANSWER: &str = "قیمت‌ها از ۱۰۰ هزار تومان شروع می‌شود.";

fn seeded_agent(setup: &TestSetup) -> AnswerAgent<SqliteProvider> {
    AnswerAgent::builder(Arc::new(setup.provider.clone())).build()
}

#[tokio::test]
async fn test_grounded_faq_answer() {
    setup_tracing();

    // --- 1. Arrange ---
    let setup = TestSetup::new().await.expect("test setup failed");
    let faq_id = setup
        .seed_faq(SEEDED_QUESTION, SEEDED_ANSWER, None)
        .await
        .expect("seeding failed");
    let agent = seeded_agent(&setup);

    // --- 2. Act ---
    let result = agent
        .answer_user_query(Some("user-1"), None, PRICE_QUESTION, "auto", None)
        .await;

    // --- 3. Assert ---
    assert!(result.success);
    assert_eq!(result.source, AnswerSource::Faq);
    assert_eq!(result.intent, Intent::Faq);
    assert_eq!(result.answer_text, SEEDED_ANSWER);
    assert_eq!(result.matched_ids, vec![faq_id]);
    assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    assert_eq!(result.metadata["retrieval_method"], json!("keyword"));
    assert!(result.metadata.contains_key("processing_time_ms"));

    // Exactly one chat log entry, recording the success.
    let logs = setup.fetch_chat_logs().await.expect("log read failed");
    assert_eq!(logs.len(), 1);
    assert!(logs[0].success);
    assert_eq!(logs[0].intent, "faq");
    assert_eq!(logs[0].matched_ids, format!("[{faq_id}]"));
}

#[tokio::test]
async fn test_empty_message_is_a_logged_validation_fallback() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    let agent = seeded_agent(&setup);

    let result = agent
        .answer_user_query(None, None, "", "auto", None)
        .await;

    assert!(!result.success);
    assert_eq!(result.source, AnswerSource::Fallback);
    assert!(result.matched_ids.is_empty());
    assert!(result.metadata.contains_key("error"));

    // The validation failure itself is the only thing logged.
    let logs = setup.fetch_chat_logs().await.expect("log read failed");
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
}

#[tokio::test]
async fn test_gibberish_falls_through_to_unknown() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    let agent = seeded_agent(&setup);

    let result = agent
        .answer_user_query(None, None, "asdkjhasd", "auto", None)
        .await;

    assert_eq!(result.intent, Intent::Unknown);
    assert_eq!(result.source, AnswerSource::Fallback);
    assert!(!result.success);
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn test_greeting_gets_the_static_reply() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    let agent = seeded_agent(&setup);

    let result = agent
        .answer_user_query(None, Some("session-9"), "سلام", "auto", None)
        .await;

    assert!(result.success);
    assert_eq!(result.source, AnswerSource::Static);
    assert_eq!(result.answer_text, GREETING_REPLY);
    assert_eq!(result.confidence, 1.0);
    // Greeting skips retrieval entirely.
    assert_eq!(result.metadata["retrieval_method"], json!("none"));
}

#[tokio::test]
async fn test_category_listing_comes_from_the_store() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    setup
        .seed_category("پرداخت", "payment")
        .await
        .expect("seeding failed");
    setup
        .seed_category("ارسال", "shipping")
        .await
        .expect("seeding failed");
    let agent = seeded_agent(&setup);

    let result = agent
        .answer_user_query(None, None, "دسته‌بندی سوالات را نشان بده", "auto", None)
        .await;

    assert!(result.success);
    assert_eq!(result.source, AnswerSource::Database);
    assert_eq!(result.intent, Intent::Category);
    assert!(result.answer_text.contains("پرداخت"));
    assert!(result.answer_text.contains("ارسال"));
    assert_eq!(result.metadata["category_count"], json!(2));
}

#[tokio::test]
async fn test_generation_timeout_returns_the_unenhanced_answer() {
    setup_tracing();

    // --- 1. Arrange: a generator that is slower than its budget ---
    let setup = TestSetup::new().await.expect("test setup failed");
    setup
        .seed_faq(SEEDED_QUESTION, SEEDED_ANSWER, None)
        .await
        .expect("seeding failed");

    let config = AgentConfig {
        enhancement_timeout: Duration::from_millis(50),
        ..AgentConfig::default()
    };
    let slow = SlowAiProvider::new(Duration::from_millis(500), "پاسخ بازنویسی‌شده");
    let agent = AnswerAgent::builder(Arc::new(setup.provider.clone()))
        .config(config)
        .generator(Box::new(slow))
        .build();

    // --- 2. Act ---
    let result = agent
        .answer_user_query(None, None, PRICE_QUESTION, "friendly", None)
        .await;

    // --- 3. Assert: the pre-enhancement handler output survives ---
    assert!(result.success);
    assert_eq!(result.answer_text, SEEDED_ANSWER);
    assert_eq!(result.source, AnswerSource::Faq);
    assert_eq!(result.metadata["llm_used"], json!(false));
}

#[tokio::test]
async fn test_confidence_stays_in_bounds_for_arbitrary_input() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    let agent = seeded_agent(&setup);

    for message in ["سلام", "قیمت؟", "xyz", "۱۲۳", "دسته‌ها"] {
        let result = agent
            .answer_user_query(None, None, message, "auto", None)
            .await;
        assert!(
            (0.0..=1.0).contains(&result.confidence),
            "confidence out of bounds for '{message}': {}",
            result.confidence
        );
    }
}

#[tokio::test]
async fn test_every_query_writes_exactly_one_log_entry() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    setup
        .seed_faq(SEEDED_QUESTION, SEEDED_ANSWER, None)
        .await
        .expect("seeding failed");
    let agent = seeded_agent(&setup);

    let messages = [PRICE_QUESTION, "سلام", "asdkjhasd", ""];
    for message in &messages {
        agent
            .answer_user_query(Some("user-7"), None, message, "auto", None)
            .await;
    }

    let logs = setup.fetch_chat_logs().await.expect("log read failed");
    assert_eq!(logs.len(), messages.len());
}
