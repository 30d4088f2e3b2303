//! # Admin Endpoint Tests
//!
//! Covers the thin knowledge base wrappers: FAQ and category creation,
//! listing, and the embedding backfill endpoint with and without the
//! embedding capability configured.

use porseman_server::config::{AgentTuning, AppConfig, EmbeddingProviderConfig};
use porseman_server::run;
use reqwest::Client;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        db_url: ":memory:".to_string(),
        agent: AgentTuning::default(),
        embedding: None,
        generation: None,
        classification: None,
    }
}

async fn spawn_app(config: AppConfig) -> String {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{port}");

    tokio::spawn(async move {
        if let Err(e) = run(listener, config).await {
            eprintln!("Server error: {e}");
        }
    });

    sleep(Duration::from_millis(100)).await;

    address
}

#[tokio::test]
async fn test_faq_creation_reuses_category_by_slug() {
    let address = spawn_app(test_config()).await;
    let client = Client::new();

    // --- 1. Arrange: a category created up front ---
    let created = client
        .post(format!("{address}/categories"))
        .json(&json!({ "name": "پرداخت", "slug": "payment" }))
        .send()
        .await
        .expect("Failed to create category");
    assert!(created.status().is_success());
    let created: serde_json::Value = created.json().await.expect("Invalid JSON body");
    let category_id = created["result"]["id"].as_i64().expect("missing id");

    // --- 2. Act: create an FAQ naming the same slug ---
    let response = client
        .post(format!("{address}/faqs"))
        .json(&json!({
            "question": "روش‌های پرداخت چیست؟",
            "answer": "پرداخت آنلاین و در محل پشتیبانی می‌شود.",
            "category": { "name": "پرداخت", "slug": "payment" }
        }))
        .send()
        .await
        .expect("Failed to create FAQ");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");

    // --- 3. Assert: the existing category row was reused ---
    assert_eq!(body["result"]["category_id"].as_i64(), Some(category_id));

    let categories: serde_json::Value = client
        .get(format!("{address}/categories"))
        .send()
        .await
        .expect("Failed to list categories")
        .json()
        .await
        .expect("Invalid JSON body");
    assert_eq!(categories["result"].as_array().map(Vec::len), Some(1));

    let faqs: serde_json::Value = client
        .get(format!("{address}/faqs"))
        .send()
        .await
        .expect("Failed to list FAQs")
        .json()
        .await
        .expect("Invalid JSON body");
    let listed = faqs["result"].as_array().expect("expected an array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["question"], json!("روش‌های پرداخت چیست؟"));
}

#[tokio::test]
async fn test_create_faq_rejects_blank_fields() {
    let address = spawn_app(test_config()).await;
    let client = Client::new();

    let response = client
        .post(format!("{address}/faqs"))
        .json(&json!({ "question": "  ", "answer": "x" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_embed_backfill_requires_the_embedding_capability() {
    let address = spawn_app(test_config()).await;
    let client = Client::new();

    let response = client
        .post(format!("{address}/embed/new"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 503);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert!(body["error"]
        .as_str()
        .expect("expected an error message")
        .contains("embedding"));
}

#[tokio::test]
async fn test_embed_backfill_embeds_pending_records() {
    // --- 1. Arrange: a mock embeddings API and a server wired to it ---
    let embeddings_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.1, 0.2, 0.3] }]
        })))
        .mount(&embeddings_server)
        .await;

    let mut config = test_config();
    config.embedding = Some(EmbeddingProviderConfig {
        api_url: format!("{}/v1/embeddings", embeddings_server.uri()),
        model_name: "test-embedding-model".to_string(),
        api_key: None,
    });
    let address = spawn_app(config).await;
    let client = Client::new();

    client
        .post(format!("{address}/faqs"))
        .json(&json!({
            "question": "شرایط مرجوعی چیست؟",
            "answer": "کالا تا هفت روز قابل مرجوع است."
        }))
        .send()
        .await
        .expect("Failed to create FAQ");

    // --- 2. Act ---
    let response = client
        .post(format!("{address}/embed/new"))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");

    // --- 3. Assert: one record embedded, and a second run finds nothing ---
    assert_eq!(body["result"]["embedded"], json!(1));

    let second: serde_json::Value = client
        .post(format!("{address}/embed/new"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON body");
    assert_eq!(second["result"]["embedded"], json!(0));
}
