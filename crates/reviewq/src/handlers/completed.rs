//! Completed log handlers.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use reviewq_core::review::{
    CompletedPage, CompletedReview, ExportQuery, ListCompletedQuery, ReviewStats,
};

use crate::{handlers::ApiError, lifecycle, state::AppState};

/// GET /api/completed?view=summary|detail&limit=N
#[axum::debug_handler]
pub async fn list_completed(
    State(state): State<AppState>,
    query: Result<Query<ListCompletedQuery>, QueryRejection>,
) -> Result<Json<CompletedPage>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let page = lifecycle::list_completed(&state.connections, &state.config, query)
        .await
        .map_err(ApiError::read)?;
    Ok(Json(page))
}

/// GET /api/completed/{review_id} - Latest review recorded for a pending id.
#[axum::debug_handler]
pub async fn get_completed(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<CompletedReview>, ApiError> {
    let review = lifecycle::find_completed(&state.connections, &review_id)
        .await
        .map_err(ApiError::read)?;
    Ok(Json(review))
}

/// GET /api/completed/stats
#[axum::debug_handler]
pub async fn completed_stats(State(state): State<AppState>) -> Result<Json<ReviewStats>, ApiError> {
    let stats = lifecycle::stats(&state.connections)
        .await
        .map_err(ApiError::read)?;
    Ok(Json(stats))
}

/// GET /api/completed/export?min_rating=N - Training examples as NDJSON.
#[axum::debug_handler]
pub async fn export_training(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let examples = lifecycle::export(&state.connections, query)
        .await
        .map_err(ApiError::read)?;

    let mut body = String::new();
    for example in &examples {
        let line = serde_json::to_string(example)
            .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        body.push_str(&line);
        body.push('\n');
    }

    Ok(([(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response())
}
