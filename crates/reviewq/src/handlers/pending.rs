//! Pending queue handlers: fetch, submit and reset.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use reviewq_core::review::{NextReview, PendingPage, ResetReceipt, ResetRequest, SubmitReceipt};

use crate::{handlers::ApiError, lifecycle, state::AppState};

/// GET /api/pending/next - The next item to review plus counters.
#[axum::debug_handler]
pub async fn next_review(State(state): State<AppState>) -> Result<Json<NextReview>, ApiError> {
    let next = lifecycle::fetch_one(&state.connections)
        .await
        .map_err(ApiError::read)?;
    Ok(Json(next))
}

/// GET /api/pending - The whole pending queue, capped at `FETCH_ALL_LIMIT`.
#[axum::debug_handler]
pub async fn list_pending(State(state): State<AppState>) -> Result<Json<PendingPage>, ApiError> {
    let page = lifecycle::fetch_all(&state.connections, state.config.fetch_all_limit)
        .await
        .map_err(ApiError::read)?;
    Ok(Json(page))
}

/// POST /api/submit - Record a verdict.
#[axum::debug_handler]
pub async fn submit_review(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitReceipt>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let receipt = lifecycle::submit(&state.connections, body)
        .await
        .map_err(ApiError::write)?;
    Ok(Json(receipt))
}

/// POST /api/reset - Restore the pending queue from the backup snapshot.
#[axum::debug_handler]
pub async fn reset_pending(
    State(state): State<AppState>,
    body: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<ResetReceipt>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    tracing::warn!("Reset requested");
    let receipt = lifecycle::reset(&state.connections, request)
        .await
        .map_err(ApiError::write)?;
    Ok(Json(receipt))
}
