//! # API Types
//!
//! Request and response payloads for the HTTP surface, plus the shared
//! `ApiResponse` wrapper used by the admin endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The standard wrapper for admin endpoint responses, optionally carrying
/// debug information when `?debug=true` is requested.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    pub result: T,
}

#[derive(Deserialize, Default)]
pub struct DebugParams {
    pub debug: Option<bool>,
}

/// The delivery style of an answer.
///
/// A missing or unrecognized style silently resolves to `Auto`. That
/// fallback is intentional product behavior: clients must always get an
/// answer, and the resolved style is echoed back so they can see what was
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStyle {
    Auto,
    Formal,
    Friendly,
}

impl ResponseStyle {
    /// Resolves a client-supplied style tag, falling back to `Auto`.
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("formal") => ResponseStyle::Formal,
            Some("friendly") => ResponseStyle::Friendly,
            _ => ResponseStyle::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStyle::Auto => "auto",
            ResponseStyle::Formal => "formal",
            ResponseStyle::Friendly => "friendly",
        }
    }

    /// The instruction handed to the answer composer for this style.
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            ResponseStyle::Auto => "همان لحن پاسخ اصلی را حفظ کن.",
            ResponseStyle::Formal => "لحن رسمی و مودبانه.",
            ResponseStyle::Friendly => "لحن دوستانه و صمیمی.",
        }
    }
}

// --- Chat ---

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub style: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub context: Option<Value>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// The concrete style that was applied, never absent.
    pub style: String,
    pub intent: String,
    pub source: String,
    pub success: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- Admin ---

#[derive(Deserialize)]
pub struct CreateFaqRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<CategoryPayload>,
}

#[derive(Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub slug: String,
}

#[derive(Serialize)]
pub struct CreateFaqResponse {
    pub id: i64,
    pub category_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
}

#[derive(Serialize)]
pub struct CreateCategoryResponse {
    pub id: i64,
}

#[derive(Deserialize, Default)]
pub struct ListFaqsParams {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct EmbedNewResponse {
    pub message: String,
    pub embedded: usize,
}
