//! # Orchestrator
//!
//! `AnswerAgent` sequences one query through the pipeline:
//! normalize → classify → retrieve (skipped for intents that do not consume
//! the knowledge base) → handle → enhance → log. It owns error containment:
//! whatever happens inside, the caller gets one well-formed `AnswerResult`,
//! with failure detail confined to `metadata` and the chat log written
//! exactly once on every exit path.

use crate::compose::enhance;
use crate::errors::AgentError;
use crate::handlers::{self, EMPTY_MESSAGE_REPLY, INTERNAL_ERROR_REPLY};
use crate::intent::{Classifier, IntentDetector};
use crate::normalize::normalize;
use crate::providers::ai::{AiProvider, EmbeddingClient};
use crate::providers::db::storage::{
    CategoryStore, ChatLogStore, KeywordSearch, VectorSearch,
};
use crate::search::retrieve;
use crate::types::{
    AgentConfig, AnswerResult, ChatLogEntry, Intent, NormalizedQuery, RetrievalResult,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A builder for [`AnswerAgent`] instances.
///
/// The storage provider is the only required piece; generation, embeddings
/// and the smart intent detector are optional capabilities whose absence
/// degrades the pipeline instead of breaking it.
pub struct AnswerAgentBuilder<P> {
    provider: Arc<P>,
    config: AgentConfig,
    generator: Option<Box<dyn AiProvider>>,
    embedder: Option<EmbeddingClient>,
    smart_detector: Option<Box<dyn IntentDetector>>,
}

impl<P> AnswerAgentBuilder<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            config: AgentConfig::default(),
            generator: None,
            embedder: None,
            smart_detector: None,
        }
    }

    /// Overrides the default tuning values.
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Configures the text-generation capability used by the composer.
    pub fn generator(mut self, generator: Box<dyn AiProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Configures the embedding capability used by semantic retrieval.
    pub fn embedder(mut self, embedder: EmbeddingClient) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Configures the smart intent detector tried before the keyword matcher.
    pub fn smart_detector(mut self, detector: Box<dyn IntentDetector>) -> Self {
        self.smart_detector = Some(detector);
        self
    }

    pub fn build(self) -> AnswerAgent<P> {
        let classifier = Classifier::new(self.smart_detector, self.config.classification_timeout);
        AnswerAgent {
            provider: self.provider,
            config: self.config,
            classifier,
            generator: self.generator,
            embedder: self.embedder,
        }
    }
}

/// The answering agent. One instance serves any number of concurrent
/// queries; each query only reads shared state, the sole write being the
/// append-only chat log.
pub struct AnswerAgent<P> {
    provider: Arc<P>,
    config: AgentConfig,
    classifier: Classifier,
    generator: Option<Box<dyn AiProvider>>,
    embedder: Option<EmbeddingClient>,
}

impl<P> AnswerAgent<P>
where
    P: KeywordSearch + VectorSearch + CategoryStore + ChatLogStore + Send + Sync,
{
    pub fn builder(provider: Arc<P>) -> AnswerAgentBuilder<P> {
        AnswerAgentBuilder::new(provider)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answers a free-text user message.
    ///
    /// Never returns an error: validation failures, capability outages and
    /// storage errors all surface as a fallback `AnswerResult` with
    /// `success = false` and the detail recorded in `metadata` only.
    pub async fn answer_user_query(
        &self,
        user_id: Option<&str>,
        session_id: Option<&str>,
        message: &str,
        style: &str,
        context: Option<Value>,
    ) -> AnswerResult {
        let started = Instant::now();
        info!("Answering query for user: {user_id:?}");

        let (query, mut result) = match normalize(message, self.config.max_input_chars) {
            Ok(query) => {
                let result = match self.run_pipeline(&query, style).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        // The orchestrator boundary: infrastructure failures
                        // become a terminal fallback, never a raw error.
                        error!("Pipeline failed: {e}. Returning terminal fallback.");
                        let mut fallback =
                            AnswerResult::fallback(Intent::Unknown, INTERNAL_ERROR_REPLY);
                        fallback.insert_meta("error", json!(e.to_string()));
                        fallback
                    }
                };
                (query, result)
            }
            Err(e) => {
                debug!("Validation rejected the message: {e}");
                let mut fallback = AnswerResult::fallback(Intent::Unknown, EMPTY_MESSAGE_REPLY);
                fallback.insert_meta("error", json!(e.to_string()));
                let query = NormalizedQuery {
                    raw: message.to_string(),
                    normalized: String::new(),
                    canonical: String::new(),
                    truncated: false,
                };
                (query, fallback)
            }
        };

        let processing_time_ms = started.elapsed().as_millis() as u64;
        result.insert_meta("processing_time_ms", json!(processing_time_ms));
        if query.truncated {
            result.insert_meta("input_truncated", json!(true));
        }
        if let Some(context) = context {
            result.insert_meta("context", context);
        }

        self.log_query(user_id, session_id, &query, &result, processing_time_ms)
            .await;

        result
    }

    /// The fallible inner pipeline. Everything that can fail for
    /// infrastructure reasons funnels its error through here so the caller
    /// has a single containment point.
    async fn run_pipeline(
        &self,
        query: &NormalizedQuery,
        style: &str,
    ) -> Result<AnswerResult, AgentError> {
        let classification = self
            .classifier
            .classify(&query.normalized, &query.canonical)
            .await;
        debug!(
            intent = %classification.intent,
            confidence = classification.confidence,
            "Intent classified."
        );

        // Only the FAQ handler consumes generic retrieval; the other
        // intents either answer statically or do their own lookup.
        let retrieval = match classification.intent {
            Intent::Faq => {
                retrieve(
                    self.provider.as_ref(),
                    self.embedder.as_ref(),
                    &query.canonical,
                    self.config.top_k,
                    self.config.score_threshold,
                    self.config.embedding_timeout,
                )
                .await
            }
            _ => RetrievalResult::empty(Vec::new()),
        };

        let mut answer = handlers::handle(
            self.provider.as_ref(),
            classification,
            &retrieval,
            self.config.score_threshold,
        )
        .await?;

        if answer.success {
            if let Some(generator) = &self.generator {
                answer = enhance(
                    generator.as_ref(),
                    style,
                    &query.normalized,
                    answer,
                    self.config.enhancement_timeout,
                    self.config.min_enhancement_similarity,
                )
                .await;
            }
        }

        answer.insert_meta("intent_confidence", json!(classification.confidence));
        answer.insert_meta("retrieval_method", json!(retrieval.method.as_str()));
        answer.insert_meta("tables_queried", json!(retrieval.tables_queried));
        Ok(answer)
    }

    /// Appends the chat log entry for a completed query. Losing a log entry
    /// must never fail the user-facing answer, so errors are swallowed after
    /// a warning.
    async fn log_query(
        &self,
        user_id: Option<&str>,
        session_id: Option<&str>,
        query: &NormalizedQuery,
        result: &AnswerResult,
        processing_time_ms: u64,
    ) {
        let entry = ChatLogEntry {
            user_id: user_id.map(str::to_string),
            session_id: session_id.map(str::to_string),
            message: query.raw.clone(),
            normalized: query.normalized.clone(),
            canonical: query.canonical.clone(),
            intent: result.intent,
            confidence: result.confidence,
            answer: result.answer_text.clone(),
            source: result.source,
            success: result.success,
            matched_ids: result.matched_ids.clone(),
            processing_time_ms,
            created_at: chrono::Utc::now(),
        };

        if let Err(e) = self.provider.append_chat_log(&entry).await {
            warn!("Failed to append chat log entry: {e}. The answer is returned regardless.");
        }
    }
}
