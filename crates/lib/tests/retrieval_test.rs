//! # Retriever Tests
//!
//! Exercises the two-stage retrieval pipeline against a real in-memory
//! SQLite knowledge base: keyword scoring, the semantic stage behind a
//! mocked embeddings API, merge/dedup behavior, and graceful degradation.

mod common;

use crate::common::setup_tracing;
use porseman::normalize::normalize;
use porseman::providers::ai::EmbeddingClient;
use porseman::search::{cosine_similarity, retrieve};
use porseman::types::RetrievalMethod;
use porseman_test_utils::TestSetup;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMBED_TIMEOUT: Duration = Duration::from_secs(2);

/// Spawns a mock OpenAI-compatible embeddings endpoint that always returns
/// the given vector.
async fn mock_embeddings_api(vector: &[f32]) -> (MockServer, EmbeddingClient) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "embedding": vector }]
        })))
        .mount(&server)
        .await;

    let client = EmbeddingClient::new(
        format!("{}/v1/embeddings", server.uri()),
        "test-embedding-model".to_string(),
        None,
    );
    (server, client)
}

#[tokio::test]
async fn test_keyword_stage_matches_paraphrased_question() {
    setup_tracing();

    // --- 1. Arrange ---
    let setup = TestSetup::new().await.expect("test setup failed");
    let faq_id = setup
        .seed_faq(
            "هزینه محصولات چقدره؟",
            "قیمت‌ها از ۱۰۰ هزار تومان شروع می‌شود.",
            None,
        )
        .await
        .expect("seeding failed");

    let query = normalize("قیمت محصولات چقدر است؟", 1000).expect("normalize failed");

    // --- 2. Act ---
    let result = retrieve(
        &setup.provider,
        None,
        &query.canonical,
        5,
        0.35,
        EMBED_TIMEOUT,
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(result.method, RetrievalMethod::Keyword);
    assert_eq!(result.tables_queried, vec!["faq_kb".to_string()]);
    let best = result.best().expect("expected a keyword hit");
    assert_eq!(best.record_id, faq_id);
    assert!(
        best.score >= 0.35,
        "two of three query tokens overlap, got score {}",
        best.score
    );
}

#[tokio::test]
async fn test_paraphrases_retrieve_the_same_top_result() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    let target = setup
        .seed_faq("قیمت اشتراک ماهانه چقدر است؟", "اشتراک ماهانه ۵۰ هزار تومان است.", None)
        .await
        .expect("seeding failed");
    setup
        .seed_faq("ساعت کاری پشتیبانی چیست؟", "پشتیبانی از ۸ تا ۱۷ پاسخگو است.", None)
        .await
        .expect("seeding failed");

    let a = normalize("قیمت اشتراک ماهانه چقدر است؟", 1000).expect("normalize failed");
    let b = normalize("چقدر قیمت اشتراک ماهانه است؟", 1000).expect("normalize failed");
    assert_eq!(a.canonical, b.canonical);

    let result_a = retrieve(&setup.provider, None, &a.canonical, 5, 0.35, EMBED_TIMEOUT).await;
    let result_b = retrieve(&setup.provider, None, &b.canonical, 5, 0.35, EMBED_TIMEOUT).await;

    assert_eq!(
        result_a.best().map(|r| r.record_id),
        result_b.best().map(|r| r.record_id)
    );
    assert_eq!(result_a.best().map(|r| r.record_id), Some(target));
}

#[tokio::test]
async fn test_no_overlap_yields_empty_result_without_embedder() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    setup
        .seed_faq("ساعت کاری پشتیبانی چیست؟", "پشتیبانی از ۸ تا ۱۷ پاسخگو است.", None)
        .await
        .expect("seeding failed");

    let query = normalize("بازگشت وجه چگونه انجام میشود", 1000).expect("normalize failed");
    let result = retrieve(&setup.provider, None, &query.canonical, 5, 0.35, EMBED_TIMEOUT).await;

    assert!(result.entries.is_empty());
    assert_eq!(result.method, RetrievalMethod::None);
}

#[tokio::test]
async fn test_semantic_stage_fills_in_when_keywords_miss() {
    setup_tracing();

    // --- 1. Arrange: two records with orthogonal embeddings ---
    let setup = TestSetup::new().await.expect("test setup failed");
    let close_id = setup
        .seed_faq("شرایط مرجوعی کالا", "کالا تا هفت روز قابل مرجوع است.", None)
        .await
        .expect("seeding failed");
    let far_id = setup
        .seed_faq("ساعت کاری فروشگاه", "فروشگاه از ۹ تا ۲۱ باز است.", None)
        .await
        .expect("seeding failed");
    setup
        .seed_embedding(close_id, &[1.0, 0.0, 0.0])
        .await
        .expect("embedding seed failed");
    setup
        .seed_embedding(far_id, &[0.0, 1.0, 0.0])
        .await
        .expect("embedding seed failed");

    // The query embedding points at the first record.
    let (_server, embedder) = mock_embeddings_api(&[1.0, 0.0, 0.0]).await;

    // No token of this canonical appears in either stored question.
    let query = normalize("پس فرستادن خرید", 1000).expect("normalize failed");

    // --- 2. Act ---
    let result = retrieve(
        &setup.provider,
        Some(&embedder),
        &query.canonical,
        5,
        0.35,
        EMBED_TIMEOUT,
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(result.method, RetrievalMethod::Vector);
    let best = result.best().expect("expected a vector hit");
    assert_eq!(best.record_id, close_id);
    assert!(best.score > 0.99, "identical vectors should score ~1.0");
}

#[tokio::test]
async fn test_merge_deduplicates_and_keeps_higher_score() {
    setup_tracing();

    // --- 1. Arrange: one record reachable by both stages ---
    let setup = TestSetup::new().await.expect("test setup failed");
    let both_id = setup
        .seed_faq("قیمت", "لیست قیمت در سایت موجود است.", None)
        .await
        .expect("seeding failed");
    let vector_only_id = setup
        .seed_faq("ارسال رایگان", "سفارش بالای ۵۰۰ هزار تومان ارسال رایگان دارد.", None)
        .await
        .expect("seeding failed");
    setup
        .seed_embedding(both_id, &[1.0, 0.0])
        .await
        .expect("embedding seed failed");
    setup
        .seed_embedding(vector_only_id, &[0.8, 0.6])
        .await
        .expect("embedding seed failed");

    let (_server, embedder) = mock_embeddings_api(&[1.0, 0.0]).await;
    let query = normalize("قیمت", 1000).expect("normalize failed");

    // --- 2. Act ---
    let result = retrieve(
        &setup.provider,
        Some(&embedder),
        &query.canonical,
        5,
        0.35,
        EMBED_TIMEOUT,
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(result.method, RetrievalMethod::Hybrid);
    // Two records, not three: the double hit collapses to one entry.
    assert_eq!(result.entries.len(), 2);
    let best = &result.entries[0];
    assert_eq!(best.record_id, both_id);
    // The keyword stage scored this record 1.0 and the vector stage ~1.0;
    // the merged entry keeps the keyword slot and the higher score.
    assert!((best.score - 1.0).abs() < 1e-9);
    assert_eq!(result.entries[1].record_id, vector_only_id);
}

#[tokio::test]
async fn test_embedding_failure_degrades_to_keyword_results() {
    setup_tracing();

    let setup = TestSetup::new().await.expect("test setup failed");
    setup
        .seed_faq("قیمت اشتراک", "اشتراک ماهانه ۵۰ هزار تومان است.", None)
        .await
        .expect("seeding failed");

    // An embeddings endpoint that always errors.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let embedder = EmbeddingClient::new(
        format!("{}/v1/embeddings", server.uri()),
        "test-embedding-model".to_string(),
        None,
    );

    let query = normalize("قیمت اشتراک چقدر است؟", 1000).expect("normalize failed");
    let result = retrieve(
        &setup.provider,
        Some(&embedder),
        &query.canonical,
        5,
        0.35,
        EMBED_TIMEOUT,
    )
    .await;

    // The broken capability must not lose the keyword hits.
    assert_eq!(result.method, RetrievalMethod::Keyword);
    assert!(result.best().is_some());
}

#[test]
fn test_cosine_similarity_bounds() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
}
