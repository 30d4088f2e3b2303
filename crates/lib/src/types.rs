//! # Core Types
//!
//! Shared data types for the answering pipeline: the closed intent set,
//! retrieval results, the final `AnswerResult` returned to callers, and the
//! append-only chat log projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// The closed set of intents the agent understands.
///
/// Adding an intent is an explicit enum change, which keeps the handler
/// dispatch exhaustive and compiler-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Faq,
    Category,
    Greeting,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Faq => "faq",
            Intent::Category => "category",
            Intent::Greeting => "greeting",
            Intent::Unknown => "unknown",
        }
    }

    /// Parses a label as produced by an LLM classifier. Unrecognized labels
    /// map to `None` so the caller can fall back instead of guessing.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "faq" => Some(Intent::Faq),
            "category" => Some(Intent::Category),
            "greeting" => Some(Intent::Greeting),
            "unknown" => Some(Intent::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An intent paired with the classifier's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
}

impl Classification {
    /// Builds a classification with the confidence clamped to `[0, 1]`.
    pub fn new(intent: Intent, confidence: f64) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn unknown() -> Self {
        Self::new(Intent::Unknown, 0.0)
    }
}

/// The output of the normalizer: the cleaned text plus the canonical,
/// paraphrase-invariant form used as the retrieval key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub raw: String,
    pub normalized: String,
    pub canonical: String,
    /// True when the input exceeded the configured cap and was truncated.
    pub truncated: bool,
}

/// A question/answer pair from the `faq_kb` knowledge base table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category_id: Option<i64>,
}

/// A knowledge base category from the `categories` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Which retrieval stages actually produced the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    Keyword,
    Vector,
    Hybrid,
    None,
}

impl RetrievalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMethod::Keyword => "keyword",
            RetrievalMethod::Vector => "vector",
            RetrievalMethod::Hybrid => "hybrid",
            RetrievalMethod::None => "none",
        }
    }
}

/// A single ranked knowledge base hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedRecord {
    pub record_id: i64,
    pub question: String,
    pub answer: String,
    pub category_id: Option<i64>,
    pub score: f64,
    /// The stored question text the query matched against.
    pub matched_text: String,
}

/// The ranked candidate set for one query. Entry order is rank order
/// (best first); the set is recomputed for every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub entries: Vec<RetrievedRecord>,
    pub method: RetrievalMethod,
    pub tables_queried: Vec<String>,
}

impl RetrievalResult {
    pub fn empty(tables_queried: Vec<String>) -> Self {
        Self {
            entries: Vec::new(),
            method: RetrievalMethod::None,
            tables_queried,
        }
    }

    pub fn best(&self) -> Option<&RetrievedRecord> {
        self.entries.first()
    }

    pub fn record_ids(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.record_id).collect()
    }
}

/// Where the text of an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Faq,
    Database,
    Llm,
    Static,
    Fallback,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Faq => "faq",
            AnswerSource::Database => "database",
            AnswerSource::Llm => "llm",
            AnswerSource::Static => "static",
            AnswerSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final, immutable unit returned to the caller and projected into the
/// chat log.
///
/// `matched_ids` may only reference records that were present in the
/// `RetrievalResult` consumed by the handler that produced this answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer_text: String,
    pub intent: Intent,
    pub confidence: f64,
    pub source: AnswerSource,
    pub success: bool,
    pub matched_ids: Vec<i64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AnswerResult {
    /// A terminal fallback answer. Used for business-level misses and for
    /// errors contained at the orchestrator boundary.
    pub fn fallback(intent: Intent, answer_text: impl Into<String>) -> Self {
        Self {
            answer_text: answer_text.into(),
            intent,
            confidence: 0.0,
            source: AnswerSource::Fallback,
            success: false,
            matched_ids: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn insert_meta(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }
}

/// The append-only projection of a completed query, written to `chat_logs`
/// exactly once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub message: String,
    pub normalized: String,
    pub canonical: String,
    pub intent: Intent,
    pub confidence: f64,
    pub answer: String,
    pub source: AnswerSource,
    pub success: bool,
    pub matched_ids: Vec<i64>,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Immutable tuning values for one agent instance, passed in at
/// construction. Nothing here is read from ambient state.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum number of retrieval candidates to keep.
    pub top_k: u32,
    /// Minimum score for a retrieval entry to answer an FAQ intent.
    pub score_threshold: f64,
    /// Inputs longer than this many characters are truncated, not rejected.
    pub max_input_chars: usize,
    pub classification_timeout: Duration,
    pub enhancement_timeout: Duration,
    pub embedding_timeout: Duration,
    /// Minimum lexical overlap between an LLM rewrite and the original
    /// answer for the rewrite to be accepted.
    pub min_enhancement_similarity: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            score_threshold: 0.35,
            max_input_chars: 1000,
            classification_timeout: Duration::from_secs(5),
            enhancement_timeout: Duration::from_secs(8),
            embedding_timeout: Duration::from_secs(5),
            min_enhancement_similarity: 0.3,
        }
    }
}
