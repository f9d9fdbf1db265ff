//! Method handling shared by the POST routes.

use axum::http::StatusCode;

use super::ApiError;

/// OPTIONS on a POST route: plain `200`. CORS headers come from the layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any method other than POST or OPTIONS on a POST route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
