//! # API Route Handlers
//!
//! The Axum route handlers for `porseman-server`, split by concern:
//! `chat` for the conversational endpoint, `admin` for the thin knowledge
//! base wrappers, and `general` for liveness.

pub mod admin;
pub mod chat;
pub mod general;

pub use admin::*;
pub use chat::*;
pub use general::*;

// Shared items used by multiple handler modules.
use super::{
    errors::AppError,
    state::AppState,
    types::{ApiResponse, DebugParams},
};
use axum::{extract::Query, Json};
use serde_json::Value;

/// Wraps a successful result in the standard `ApiResponse` format,
/// including debug information only when requested.
pub(crate) fn wrap_response<T>(
    result: T,
    debug_params: Query<DebugParams>,
    debug_info: Option<Value>,
) -> Json<ApiResponse<T>> {
    let debug = if debug_params.debug.unwrap_or(false) {
        debug_info
    } else {
        None
    };
    Json(ApiResponse { debug, result })
}
