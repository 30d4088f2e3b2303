//! # Intent Handlers
//!
//! One handler per intent, dispatched through an exhaustive `match` so a new
//! intent cannot be added without the compiler pointing at this module.
//! Handlers are total: a business-level miss produces a well-formed fallback
//! `AnswerResult`; only infrastructure failures propagate, to be caught at
//! the orchestrator boundary.

use crate::errors::AgentError;
use crate::providers::db::storage::CategoryStore;
use crate::types::{
    AnswerResult, AnswerSource, Classification, Intent, RetrievalResult,
};
use serde_json::json;
use tracing::debug;

/// Static reply for the greeting intent.
pub const GREETING_REPLY: &str =
    "سلام! خوش آمدید. سوال خود را بپرسید تا از پایگاه دانش پاسخ بدهم.";

/// Polite reply when no knowledge record qualifies.
pub const NOT_FOUND_REPLY: &str =
    "متأسفانه پاسخی برای سوال شما پیدا نکردم. لطفاً سوال را به شکل دیگری مطرح کنید.";

/// Reply when the category listing is empty.
pub const NO_CATEGORIES_REPLY: &str = "در حال حاضر دسته‌بندی‌ای ثبت نشده است.";

/// Header line for the category enumeration.
pub const CATEGORY_LIST_HEADER: &str = "دسته‌بندی‌های موجود:";

/// Reply for an empty or whitespace-only message.
pub const EMPTY_MESSAGE_REPLY: &str = "پیام شما خالی است. لطفاً سوال خود را بنویسید.";

/// Reply for an error contained at the orchestrator boundary.
pub const INTERNAL_ERROR_REPLY: &str =
    "مشکلی در پردازش درخواست شما پیش آمد. لطفاً دوباره تلاش کنید.";

/// Dispatches a classified query to its intent handler.
///
/// `retrieval` is the candidate set computed for this query; handlers may
/// only report `matched_ids` that are present in it.
pub async fn handle<P>(
    provider: &P,
    classification: Classification,
    retrieval: &RetrievalResult,
    threshold: f64,
) -> Result<AnswerResult, AgentError>
where
    P: CategoryStore + Send + Sync,
{
    match classification.intent {
        Intent::Faq => Ok(handle_faq(retrieval, threshold)),
        Intent::Category => handle_category(provider).await,
        Intent::Greeting => Ok(handle_greeting()),
        Intent::Unknown => Ok(handle_unknown()),
    }
}

/// Answers from the best qualifying retrieval entry, verbatim.
fn handle_faq(retrieval: &RetrievalResult, threshold: f64) -> AnswerResult {
    let best = retrieval.best().filter(|r| r.score >= threshold);

    match best {
        Some(record) => {
            debug!(
                record_id = record.record_id,
                score = record.score,
                "FAQ handler matched a knowledge record."
            );
            let mut result = AnswerResult {
                answer_text: record.answer.clone(),
                intent: Intent::Faq,
                confidence: record.score.clamp(0.0, 1.0),
                source: AnswerSource::Faq,
                success: true,
                matched_ids: vec![record.record_id],
                metadata: serde_json::Map::new(),
            };
            result.insert_meta("matched_question", json!(record.matched_text));
            result
        }
        None => AnswerResult::fallback(Intent::Faq, NOT_FOUND_REPLY),
    }
}

/// Enumerates categories straight from the store, bypassing the retriever.
async fn handle_category<P>(provider: &P) -> Result<AnswerResult, AgentError>
where
    P: CategoryStore + Send + Sync,
{
    let categories = provider
        .list_categories()
        .await
        .map_err(|e| AgentError::StorageOperationFailed(e.to_string()))?;

    let answer_text = if categories.is_empty() {
        NO_CATEGORIES_REPLY.to_string()
    } else {
        let mut lines = vec![CATEGORY_LIST_HEADER.to_string()];
        for category in &categories {
            lines.push(format!("- {}", category.name));
        }
        lines.join("\n")
    };

    let mut result = AnswerResult {
        answer_text,
        intent: Intent::Category,
        confidence: 1.0,
        source: AnswerSource::Database,
        success: true,
        matched_ids: Vec::new(),
        metadata: serde_json::Map::new(),
    };
    result.insert_meta("category_count", json!(categories.len()));
    Ok(result)
}

/// Static templated reply; no retrieval involved.
fn handle_greeting() -> AnswerResult {
    AnswerResult {
        answer_text: GREETING_REPLY.to_string(),
        intent: Intent::Greeting,
        confidence: 1.0,
        source: AnswerSource::Static,
        success: true,
        matched_ids: Vec::new(),
        metadata: serde_json::Map::new(),
    }
}

/// Default fallback for anything the classifier could not place.
fn handle_unknown() -> AnswerResult {
    AnswerResult::fallback(Intent::Unknown, NOT_FOUND_REPLY)
}
