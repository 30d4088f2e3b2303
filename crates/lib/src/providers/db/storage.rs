//! # Storage Traits
//!
//! Per-concern interfaces over the persistence boundary. The agent reads
//! the knowledge base (`faq_kb`, `categories`) and appends to `chat_logs`;
//! it never mutates knowledge records. The admin surface uses [`FaqStore`]
//! for its thin CRUD wrappers.

use crate::errors::AgentError;
use crate::search::RetrievalError;
use crate::types::{Category, ChatLogEntry, FaqRecord, RetrievedRecord};
use async_trait::async_trait;

/// Token-overlap search over `faq_kb.question`. Stage 1 of retrieval.
#[async_trait]
pub trait KeywordSearch: Send + Sync {
    async fn keyword_search(
        &self,
        canonical: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedRecord>, RetrievalError>;
}

/// Cosine-similarity search over precomputed question embeddings.
/// Stage 2 of retrieval.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn vector_search(
        &self,
        query_vector: Vec<f32>,
        limit: u32,
    ) -> Result<Vec<RetrievedRecord>, RetrievalError>;
}

/// Read access to the category listing, used by the category intent handler.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, RetrievalError>;
}

/// The admin-side write/read interface over the knowledge base.
#[async_trait]
pub trait FaqStore: Send + Sync {
    async fn insert_faq(
        &self,
        question: &str,
        answer: &str,
        category_id: Option<i64>,
    ) -> Result<i64, AgentError>;

    async fn list_faqs(&self, limit: u32) -> Result<Vec<FaqRecord>, AgentError>;

    async fn get_faq(&self, id: i64) -> Result<Option<FaqRecord>, AgentError>;

    /// Ids of knowledge records that do not have an embedding yet.
    async fn list_unembedded_faq_ids(&self) -> Result<Vec<i64>, AgentError>;

    async fn store_faq_embedding(&self, id: i64, embedding: &[f32]) -> Result<(), AgentError>;

    async fn insert_category(&self, name: &str, slug: &str) -> Result<i64, AgentError>;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AgentError>;
}

/// Append-only access to the chat log. Entries are never updated or deleted.
#[async_trait]
pub trait ChatLogStore: Send + Sync {
    async fn append_chat_log(&self, entry: &ChatLogEntry) -> Result<(), AgentError>;
}
