//! # Answer Composition
//!
//! The optional polish pass over a successful answer: an external generation
//! provider rewrites the text in the requested style, gated by a lexical
//! quality guard so the rewrite can change tone but not content. Every
//! failure path (provider error, timeout, guard rejection) keeps the
//! original answer text and marks `metadata.llm_used = false`.

use crate::normalize::canonical_tokens;
use crate::prompts::{REPHRASE_SYSTEM_PROMPT, REPHRASE_USER_PROMPT};
use crate::providers::ai::AiProvider;
use crate::types::{AnswerResult, AnswerSource};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Jaccard overlap of canonical content tokens. Used as the guard that a
/// rewrite stayed on the source answer's facts.
pub fn lexical_overlap(a: &str, b: &str) -> f64 {
    let a_tokens: HashSet<String> = canonical_tokens(a).into_iter().collect();
    let b_tokens: HashSet<String> = canonical_tokens(b).into_iter().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    let intersection = a_tokens.intersection(&b_tokens).count();
    let union = a_tokens.union(&b_tokens).count();
    intersection as f64 / union as f64
}

/// Rewrites a successful answer in the requested style.
///
/// The caller only invokes this when a generation provider is configured and
/// `answer.success` is true. The returned `AnswerResult` differs from the
/// input only in `answer_text`, `source` and metadata; facts, `matched_ids`,
/// intent and confidence are untouched.
pub async fn enhance(
    provider: &dyn AiProvider,
    style: &str,
    question: &str,
    mut answer: AnswerResult,
    timeout: Duration,
    min_similarity: f64,
) -> AnswerResult {
    let user_prompt = REPHRASE_USER_PROMPT
        .replace("{style}", style)
        .replace("{question}", question)
        .replace("{answer}", &answer.answer_text);

    let generated =
        tokio::time::timeout(timeout, provider.generate(REPHRASE_SYSTEM_PROMPT, &user_prompt))
            .await;

    match generated {
        Ok(Ok(rewritten)) => {
            let rewritten = rewritten.trim();
            let similarity = lexical_overlap(&answer.answer_text, rewritten);
            if rewritten.is_empty() || similarity < min_similarity {
                warn!(
                    similarity,
                    min_similarity, "Rejected a rewrite that drifted from the source answer."
                );
                answer.insert_meta("llm_used", json!(false));
                answer.insert_meta("enhancement_rejected", json!("quality_check"));
            } else {
                debug!(similarity, "Accepted rewritten answer.");
                answer.answer_text = rewritten.to_string();
                answer.source = AnswerSource::Llm;
                answer.insert_meta("llm_used", json!(true));
            }
        }
        Ok(Err(e)) => {
            warn!("Answer enhancement failed: {e}. Returning the original answer.");
            answer.insert_meta("llm_used", json!(false));
            answer.insert_meta("enhancement_error", json!(e.to_string()));
        }
        Err(_) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Answer enhancement timed out. Returning the original answer."
            );
            answer.insert_meta("llm_used", json!(false));
            answer.insert_meta("enhancement_error", json!("timeout"));
        }
    }

    answer
}
