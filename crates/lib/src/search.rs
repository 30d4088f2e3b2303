//! # Retrieval Logic
//!
//! The two-stage retrieval pipeline over the knowledge base:
//! 1. **Keyword**: cheap, deterministic token-overlap search, always run
//!    first.
//! 2. **Semantic**: embedding cosine similarity, run only when stage 1
//!    cannot fill `top_k` slots above the score threshold and the embedding
//!    capability is configured.
//!
//! Results are merged with stage-1 priority, deduplicated by record id
//! keeping the higher score, and ranked descending. Retrieval never fails
//! the pipeline: every failure path degrades to the best locally available
//! result and is reported through `method`/`tables_queried`.

use crate::providers::ai::EmbeddingClient;
use crate::providers::db::storage::{KeywordSearch, VectorSearch};
use crate::types::{RetrievalMethod, RetrievalResult, RetrievedRecord};
use std::cmp::Ordering;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Custom error types for the retrieval process.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error("Embedding generation failed: {0}")]
    Embedding(crate::errors::AgentError),
}

/// Cosine similarity between two vectors. Returns 0.0 for degenerate input
/// (mismatched dimensions or a zero-magnitude vector).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += *x as f64 * *y as f64;
        norm_a += *x as f64 * *x as f64;
        norm_b += *y as f64 * *y as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Merges stage-1 and stage-2 hits: duplicates (same record id) keep the
/// higher score, keyword hits win ties, and the result is ranked descending.
fn merge_results(
    keyword: Vec<RetrievedRecord>,
    vector: Vec<RetrievedRecord>,
    top_k: u32,
) -> Vec<RetrievedRecord> {
    let mut merged: Vec<(RetrievedRecord, bool)> =
        keyword.into_iter().map(|r| (r, true)).collect();

    for candidate in vector {
        if let Some((existing, _)) = merged
            .iter_mut()
            .find(|(e, _)| e.record_id == candidate.record_id)
        {
            // Stage-1 entries keep their slot at equal or higher score.
            if candidate.score > existing.score {
                existing.score = candidate.score;
            }
        } else {
            merged.push((candidate, false));
        }
    }

    merged.sort_by(|(a, a_kw), (b, b_kw)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(b_kw.cmp(a_kw))
            .then(a.record_id.cmp(&b.record_id))
    });
    merged.truncate(top_k as usize);
    merged.into_iter().map(|(r, _)| r).collect()
}

/// Retrieves ranked knowledge base candidates for a canonical query.
///
/// Infallible by contract: storage or embedding failures degrade the result
/// set instead of propagating, so a broken capability can never crash the
/// answering pipeline.
pub async fn retrieve<P>(
    provider: &P,
    embedder: Option<&EmbeddingClient>,
    canonical: &str,
    top_k: u32,
    threshold: f64,
    embedding_timeout: Duration,
) -> RetrievalResult
where
    P: KeywordSearch + VectorSearch + Send + Sync,
{
    let tables_queried = vec!["faq_kb".to_string()];

    // --- Stage 1: keyword overlap ---
    let keyword_results = match provider.keyword_search(canonical, top_k).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Keyword search failed: {e}. Continuing with empty stage-1 results.");
            Vec::new()
        }
    };

    let qualifying = keyword_results
        .iter()
        .filter(|r| r.score >= threshold)
        .count();
    debug!(
        candidates = keyword_results.len(),
        qualifying, "Keyword stage complete."
    );

    // --- Stage 2: semantic, only when stage 1 under-fills ---
    let need_semantic = qualifying < top_k as usize;
    let vector_results = if need_semantic {
        match embedder {
            Some(client) => {
                let embedded =
                    tokio::time::timeout(embedding_timeout, client.embed(canonical)).await;
                match embedded {
                    Ok(Ok(query_vector)) => {
                        match provider.vector_search(query_vector, top_k).await {
                            Ok(results) => results,
                            Err(e) => {
                                warn!("Vector search failed: {e}. Keeping keyword results only.");
                                Vec::new()
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        warn!("Query embedding failed: {e}. Keeping keyword results only.");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(
                            timeout_ms = embedding_timeout.as_millis() as u64,
                            "Query embedding timed out. Keeping keyword results only."
                        );
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let method = match (keyword_results.is_empty(), vector_results.is_empty()) {
        (false, false) => RetrievalMethod::Hybrid,
        (false, true) => RetrievalMethod::Keyword,
        (true, false) => RetrievalMethod::Vector,
        (true, true) => RetrievalMethod::None,
    };

    let entries = merge_results(keyword_results, vector_results, top_k);

    RetrievalResult {
        entries,
        method,
        tables_queried,
    }
}
