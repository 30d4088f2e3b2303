//! # Admin Handlers
//!
//! Thin wrappers over the persistence boundary for curating the knowledge
//! base: list/create FAQ records and categories, and backfill embeddings
//! for records that do not have one yet. The agent itself never writes
//! through these paths.

use super::{wrap_response, AppError, AppState};
use crate::types::{
    ApiResponse, CreateCategoryRequest, CreateCategoryResponse, CreateFaqRequest,
    CreateFaqResponse, DebugParams, EmbedNewResponse, ListFaqsParams,
};
use axum::{
    extract::{Query, State},
    Json,
};
use porseman::providers::db::storage::{CategoryStore, FaqStore};
use porseman::types::{Category, FaqRecord};
use serde_json::json;
use tracing::{info, warn};

/// Handler for `GET /faqs`.
pub async fn list_faqs_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Query(params): Query<ListFaqsParams>,
) -> Result<Json<ApiResponse<Vec<FaqRecord>>>, AppError> {
    let limit = params.limit.unwrap_or(100);
    let faqs = app_state.sqlite_provider.list_faqs(limit).await?;
    let debug_info = json!({ "limit": limit, "count": faqs.len() });
    Ok(wrap_response(faqs, debug_params, Some(debug_info)))
}

/// Handler for `POST /faqs`.
///
/// Accepts an optional inline category; an existing slug is reused, a new
/// one is created.
pub async fn create_faq_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<CreateFaqRequest>,
) -> Result<Json<ApiResponse<CreateFaqResponse>>, AppError> {
    if payload.question.trim().is_empty() || payload.answer.trim().is_empty() {
        return Err(AppError::Agent(porseman::AgentError::Validation(
            "question and answer must not be empty".to_string(),
        )));
    }

    let category_id = match &payload.category {
        Some(category) => {
            let existing = app_state
                .sqlite_provider
                .find_category_by_slug(&category.slug)
                .await?;
            match existing {
                Some(found) => Some(found.id),
                None => Some(
                    app_state
                        .sqlite_provider
                        .insert_category(&category.name, &category.slug)
                        .await?,
                ),
            }
        }
        None => None,
    };

    let id = app_state
        .sqlite_provider
        .insert_faq(&payload.question, &payload.answer, category_id)
        .await?;
    info!(id, "Created knowledge record.");

    let debug_info = json!({ "question": payload.question });
    Ok(wrap_response(
        CreateFaqResponse { id, category_id },
        debug_params,
        Some(debug_info),
    ))
}

/// Handler for `GET /categories`.
pub async fn list_categories_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Category>>>, AppError> {
    let categories = app_state
        .sqlite_provider
        .list_categories()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let debug_info = json!({ "count": categories.len() });
    Ok(wrap_response(categories, debug_params, Some(debug_info)))
}

/// Handler for `POST /categories`.
pub async fn create_category_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<CreateCategoryResponse>>, AppError> {
    if payload.name.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(AppError::Agent(porseman::AgentError::Validation(
            "name and slug must not be empty".to_string(),
        )));
    }
    let id = app_state
        .sqlite_provider
        .insert_category(&payload.name, &payload.slug)
        .await?;
    Ok(wrap_response(
        CreateCategoryResponse { id },
        debug_params,
        None,
    ))
}

/// Handler for `POST /embed/new`.
///
/// Generates embeddings for every knowledge record that does not have one
/// yet. Requires the embedding capability; records that fail to embed are
/// skipped with a warning so a flaky API cannot abort the whole backfill.
pub async fn embed_new_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<EmbedNewResponse>>, AppError> {
    let embedder = app_state
        .embedder
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("embedding".to_string()))?;

    let pending = app_state.sqlite_provider.list_unembedded_faq_ids().await?;
    info!("Embedding backfill requested for {} records.", pending.len());

    let mut embedded = 0;
    for id in &pending {
        let Some(faq) = app_state.sqlite_provider.get_faq(*id).await? else {
            continue;
        };
        match embedder.embed(&faq.question).await {
            Ok(vector) => {
                app_state
                    .sqlite_provider
                    .store_faq_embedding(*id, &vector)
                    .await?;
                embedded += 1;
            }
            Err(e) => {
                warn!(record_id = id, "Failed to embed question: {e}. Skipping.");
            }
        }
    }

    let debug_info = json!({ "pending": pending.len(), "embedded": embedded });
    Ok(wrap_response(
        EmbedNewResponse {
            message: "Embedding backfill complete".to_string(),
            embedded,
        },
        debug_params,
        Some(debug_info),
    ))
}
