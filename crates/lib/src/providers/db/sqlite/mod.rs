//! # SQLite Storage Provider
//!
//! A provider for interacting with a local SQLite database using Turso.
//! Holds a `Database` instance, which manages a connection pool; cloning
//! shares the same underlying database, allowing concurrent access to one
//! file or in-memory instance.

use crate::normalize::canonical_tokens;
use crate::search::{cosine_similarity, RetrievalError};
use crate::{
    errors::AgentError,
    providers::db::storage::{
        CategoryStore, ChatLogStore, FaqStore, KeywordSearch, VectorSearch,
    },
    types::{Category, ChatLogEntry, FaqRecord, RetrievedRecord},
};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use tracing::{debug, info, warn};
use turso::{params, Database, Value as TursoValue};

pub mod sql;

/// How many candidate rows the keyword pre-filter fetches per requested
/// result, before scoring in Rust narrows them down.
const KEYWORD_CANDIDATE_FACTOR: u32 = 4;

#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for
    ///   a unique, isolated in-memory database. To share an in-memory
    ///   database across multiple `SqliteProvider` instances (e.g. in
    ///   tests), create one provider and then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, AgentError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        // Enable WAL mode for better concurrency on file-based databases.
        // It has no effect on in-memory databases but is safe to run.
        let conn = db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;
        // Use `query` for PRAGMA statements that return a value to avoid
        // "unexpected row" errors.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Ensures that all required application tables and indexes exist.
    /// Idempotent and safe to call on every application startup.
    pub async fn initialize_schema(&self) -> Result<(), AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// A helper for tests to pre-populate data by executing multiple SQL
    /// statements.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

/// Decodes an embedding BLOB of little-endian `f32`s.
fn decode_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.is_empty() || blob.len() % 4 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(blob.len() / 4);
    for chunk in blob.chunks_exact(4) {
        out.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Some(out)
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Reads one `faq_kb` row (id, question, answer, category_id) from a result
/// row, without the score.
fn faq_row_fields(row: &turso::Row) -> Result<(i64, String, String, Option<i64>), turso::Error> {
    let id = match row.get_value(0)? {
        TursoValue::Integer(i) => i,
        _ => 0,
    };
    let question = match row.get_value(1)? {
        TursoValue::Text(s) => s,
        _ => String::new(),
    };
    let answer = match row.get_value(2)? {
        TursoValue::Text(s) => s,
        _ => String::new(),
    };
    let category_id = match row.get_value(3)? {
        TursoValue::Integer(i) => Some(i),
        _ => None,
    };
    Ok((id, question, answer, category_id))
}

fn sort_by_score_desc(results: &mut [RetrievedRecord]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.record_id.cmp(&b.record_id))
    });
}

#[async_trait]
impl KeywordSearch for SqliteProvider {
    /// Token-overlap search over `faq_kb.question`.
    ///
    /// Candidate rows are pre-filtered in SQL with per-token `LIKE` clauses,
    /// then scored in Rust as the fraction of canonical query tokens found
    /// in the stored question's canonical tokens, so keyword scores live on
    /// the same `[0, 1]` scale as cosine scores.
    async fn keyword_search(
        &self,
        canonical: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedRecord>, RetrievalError> {
        let query_tokens: Vec<&str> = canonical.split_whitespace().collect();
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        info!("Executing keyword search for: '{canonical}'");

        let conn = self.db.connect()?;

        let conditions: Vec<String> = query_tokens
            .iter()
            .map(|_| "question LIKE ?".to_string())
            .collect();
        let query_params: Vec<TursoValue> = query_tokens
            .iter()
            .map(|t| TursoValue::Text(format!("%{t}%")))
            .collect();

        let sql = format!(
            "SELECT id, question, answer, category_id FROM faq_kb WHERE {} LIMIT {}",
            conditions.join(" OR "),
            limit * KEYWORD_CANDIDATE_FACTOR
        );
        debug!(sql = %sql, "Executing keyword search SQL");

        let mut rows = conn.query(&sql, query_params).await?;
        let mut results = Vec::new();

        while let Some(row) = rows.next().await? {
            let (id, question, answer, category_id) = faq_row_fields(&row)?;
            let record_tokens = canonical_tokens(&question);
            let matched = query_tokens
                .iter()
                .filter(|t| record_tokens.iter().any(|r| r == *t))
                .count();
            if matched == 0 {
                continue;
            }
            let score = matched as f64 / query_tokens.len() as f64;
            results.push(RetrievedRecord {
                record_id: id,
                matched_text: question.clone(),
                question,
                answer,
                category_id,
                score,
            });
        }

        sort_by_score_desc(&mut results);
        results.truncate(limit as usize);
        Ok(results)
    }
}

#[async_trait]
impl VectorSearch for SqliteProvider {
    /// Cosine-similarity search against the precomputed question embeddings.
    ///
    /// Embeddings are decoded from their BLOB column and compared in Rust;
    /// rows with a malformed or dimension-mismatched embedding are skipped
    /// with a warning rather than failing the search.
    async fn vector_search(
        &self,
        query_vector: Vec<f32>,
        limit: u32,
    ) -> Result<Vec<RetrievedRecord>, RetrievalError> {
        info!("Executing vector search on faq_kb.");
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                "SELECT id, question, answer, category_id, embedding FROM faq_kb
                 WHERE embedding IS NOT NULL",
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let (id, question, answer, category_id) = faq_row_fields(&row)?;
            let embedding = match row.get_value(4)? {
                TursoValue::Blob(b) => decode_embedding(&b),
                _ => None,
            };
            let Some(embedding) = embedding else {
                warn!(record_id = id, "Skipping faq_kb row with malformed embedding blob.");
                continue;
            };
            if embedding.len() != query_vector.len() {
                warn!(
                    record_id = id,
                    "Skipping faq_kb row with mismatched embedding dimension."
                );
                continue;
            }
            let score = cosine_similarity(&query_vector, &embedding).clamp(0.0, 1.0);
            results.push(RetrievedRecord {
                record_id: id,
                matched_text: question.clone(),
                question,
                answer,
                category_id,
                score,
            });
        }

        sort_by_score_desc(&mut results);
        results.truncate(limit as usize);
        Ok(results)
    }
}

#[async_trait]
impl CategoryStore for SqliteProvider {
    async fn list_categories(&self) -> Result<Vec<Category>, RetrievalError> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query("SELECT id, name, slug FROM categories ORDER BY name", ())
            .await?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            let id = match row.get_value(0)? {
                TursoValue::Integer(i) => i,
                _ => 0,
            };
            let name = match row.get_value(1)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            let slug = match row.get_value(2)? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            categories.push(Category { id, name, slug });
        }
        Ok(categories)
    }
}

#[async_trait]
impl FaqStore for SqliteProvider {
    async fn insert_faq(
        &self,
        question: &str,
        answer: &str,
        category_id: Option<i64>,
    ) -> Result<i64, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let category_value = match category_id {
            Some(id) => TursoValue::Integer(id),
            None => TursoValue::Null,
        };
        let mut stmt = conn
            .prepare("INSERT INTO faq_kb (question, answer, category_id) VALUES (?, ?, ?) RETURNING id")
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
        let mut rows = stmt
            .query(params![question.to_string(), answer.to_string(), category_value])
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?
        {
            if let Ok(TursoValue::Integer(id)) = row.get_value(0) {
                return Ok(id);
            }
        }
        Err(AgentError::StorageOperationFailed(
            "INSERT INTO faq_kb did not return an id".to_string(),
        ))
    }

    async fn list_faqs(&self, limit: u32) -> Result<Vec<FaqRecord>, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let sql = format!(
            "SELECT id, question, answer, category_id FROM faq_kb ORDER BY id LIMIT {limit}"
        );
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;

        let mut faqs = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?
        {
            let (id, question, answer, category_id) = faq_row_fields(&row)
                .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
            faqs.push(FaqRecord {
                id,
                question,
                answer,
                category_id,
            });
        }
        Ok(faqs)
    }

    async fn get_faq(&self, id: i64) -> Result<Option<FaqRecord>, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT id, question, answer, category_id FROM faq_kb WHERE id = ?")
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
        let mut rows = stmt
            .query(params![id])
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?
        {
            let (id, question, answer, category_id) = faq_row_fields(&row)
                .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
            return Ok(Some(FaqRecord {
                id,
                question,
                answer,
                category_id,
            }));
        }
        Ok(None)
    }

    async fn list_unembedded_faq_ids(&self) -> Result<Vec<i64>, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let mut rows = conn
            .query("SELECT id FROM faq_kb WHERE embedding IS NULL ORDER BY id", ())
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;

        let mut ids = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?
        {
            if let Ok(TursoValue::Integer(id)) = row.get_value(0) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn store_faq_embedding(&self, id: i64, embedding: &[f32]) -> Result<(), AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let bytes = encode_embedding(embedding);
        conn.execute(
            "UPDATE faq_kb SET embedding = ? WHERE id = ?",
            params![bytes.as_slice(), id],
        )
        .await
        .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
        Ok(())
    }

    async fn insert_category(&self, name: &str, slug: &str) -> Result<i64, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let mut stmt = conn
            .prepare("INSERT INTO categories (name, slug) VALUES (?, ?) RETURNING id")
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
        let mut rows = stmt
            .query(params![name.to_string(), slug.to_string()])
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?
        {
            if let Ok(TursoValue::Integer(id)) = row.get_value(0) {
                return Ok(id);
            }
        }
        Err(AgentError::StorageOperationFailed(
            "INSERT INTO categories did not return an id".to_string(),
        ))
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT id, name, slug FROM categories WHERE slug = ?")
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;
        let mut rows = stmt
            .query(params![slug.to_string()])
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?
        {
            let id = match row.get_value(0).map_err(|e| {
                AgentError::StorageOperationFailed(e.to_string())
            })? {
                TursoValue::Integer(i) => i,
                _ => 0,
            };
            let name = match row.get_value(1).map_err(|e| {
                AgentError::StorageOperationFailed(e.to_string())
            })? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            let slug = match row.get_value(2).map_err(|e| {
                AgentError::StorageOperationFailed(e.to_string())
            })? {
                TursoValue::Text(s) => s,
                _ => String::new(),
            };
            return Ok(Some(Category { id, name, slug }));
        }
        Ok(None)
    }
}

#[async_trait]
impl ChatLogStore for SqliteProvider {
    async fn append_chat_log(&self, entry: &ChatLogEntry) -> Result<(), AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::Persistence(e.to_string()))?;

        let matched_ids = serde_json::to_string(&entry.matched_ids)?;
        let user_id = match &entry.user_id {
            Some(id) => TursoValue::Text(id.clone()),
            None => TursoValue::Null,
        };
        let session_id = match &entry.session_id {
            Some(id) => TursoValue::Text(id.clone()),
            None => TursoValue::Null,
        };

        conn.execute(
            "INSERT INTO chat_logs
             (user_id, session_id, message, normalized, canonical, intent, confidence,
              answer, source, success, matched_ids, processing_time_ms, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                user_id,
                session_id,
                entry.message.clone(),
                entry.normalized.clone(),
                entry.canonical.clone(),
                entry.intent.as_str().to_string(),
                entry.confidence,
                entry.answer.clone(),
                entry.source.as_str().to_string(),
                entry.success as i64,
                matched_ids,
                entry.processing_time_ms as i64,
                entry.created_at.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| AgentError::Persistence(e.to_string()))?;
        Ok(())
    }
}
