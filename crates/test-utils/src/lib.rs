//! # Shared Test Utilities
//!
//! Helpers used by the integration tests across the workspace: an isolated
//! in-memory database with the full schema, seeding shortcuts for the
//! knowledge base, and a programmable mock AI provider.

use anyhow::Result;
use async_trait::async_trait;
use porseman::errors::AgentError;
use porseman::providers::ai::AiProvider;
use porseman::providers::db::sqlite::SqliteProvider;
use porseman::providers::db::storage::FaqStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use turso::Value as TursoValue;

// --- Test Setup ---

/// Manages an isolated, fully initialized in-memory database for one test.
pub struct TestSetup {
    pub provider: SqliteProvider,
}

/// One row of the `chat_logs` table, as read back by assertions.
#[derive(Debug, Clone)]
pub struct ChatLogRow {
    pub message: String,
    pub intent: String,
    pub source: String,
    pub success: bool,
    pub matched_ids: String,
}

impl TestSetup {
    /// Creates a new in-memory provider and initializes the schema.
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.initialize_schema().await?;
        Ok(Self { provider })
    }

    /// Inserts a knowledge record and returns its id.
    pub async fn seed_faq(
        &self,
        question: &str,
        answer: &str,
        category_id: Option<i64>,
    ) -> Result<i64> {
        Ok(self.provider.insert_faq(question, answer, category_id).await?)
    }

    /// Inserts a category and returns its id.
    pub async fn seed_category(&self, name: &str, slug: &str) -> Result<i64> {
        Ok(self.provider.insert_category(name, slug).await?)
    }

    /// Stores a precomputed embedding for a knowledge record.
    pub async fn seed_embedding(&self, faq_id: i64, embedding: &[f32]) -> Result<()> {
        Ok(self.provider.store_faq_embedding(faq_id, embedding).await?)
    }

    /// Reads back every chat log row in insertion order.
    pub async fn fetch_chat_logs(&self) -> Result<Vec<ChatLogRow>> {
        let conn = self.provider.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT message, intent, source, success, matched_ids
                 FROM chat_logs ORDER BY id",
                (),
            )
            .await?;

        let mut logs = Vec::new();
        while let Some(row) = rows.next().await? {
            let message = match row.get_value(0)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            let intent = match row.get_value(1)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            let source = match row.get_value(2)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            let success = match row.get_value(3)? {
                TursoValue::Integer(i) => i != 0,
                _ => false,
            };
            let matched_ids = match row.get_value(4)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            logs.push(ChatLogRow {
                message,
                intent,
                source,
                success,
                matched_ids,
            });
        }
        Ok(logs)
    }
}

// --- Mock AI Provider ---

/// A programmable [`AiProvider`] for tests. Responses are keyed on a unique
/// substring of the system prompt, and every call is recorded for
/// assertions.
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

    /// Retrieves the recorded calls for assertion.
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
    ) -> Result<String, AgentError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((system_prompt.to_string(), user_prompt.to_string()));

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if system_prompt.contains(key) {
                return Ok(response.clone());
            }
        }

        Err(AgentError::AiApi(format!(
            "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
        )))
    }
}

/// An [`AiProvider`] that sleeps before answering, for exercising the
/// pipeline's timeout handling.
#[derive(Clone, Debug)]
pub struct SlowAiProvider {
    pub delay: std::time::Duration,
    pub response: String,
}

impl SlowAiProvider {
    pub fn new(delay: std::time::Duration, response: &str) -> Self {
        Self {
            delay,
            response: response.to_string(),
        }
    }
}

#[async_trait]
impl AiProvider for SlowAiProvider {
    async fn generate(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String, AgentError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}
