use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use reviewq_core::storage::repository_error_to_status_code;

use crate::lifecycle::LifecycleError;

/// A failed request, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Status mapping for GET routes.
    ///
    /// Empty results are a normal terminal state and stay `200`.
    pub fn read(err: LifecycleError) -> Self {
        let status = match &err {
            LifecycleError::EmptyResult(_) => StatusCode::OK,
            LifecycleError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            LifecycleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LifecycleError::Repository(repo_err) | LifecycleError::Submission(repo_err) => {
                StatusCode::from_u16(repository_error_to_status_code(repo_err))
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            LifecycleError::NoBackup => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }

    /// Status mapping for POST routes: malformed input is `400`, anything
    /// else is `500`.
    pub fn write(err: LifecycleError) -> Self {
        let status = match &err {
            LifecycleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        } else if self.status.is_client_error() {
            tracing::warn!(status = %self.status, error = %self.message, "Request rejected");
        } else {
            tracing::debug!(status = %self.status, message = %self.message, "Empty result");
        }

        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reviewq_core::storage::{collection, RepositoryError};

    use super::*;

    #[test]
    fn test_read_mapping() {
        let cases = [
            (LifecycleError::EmptyResult("none"), StatusCode::OK),
            (
                LifecycleError::Connection(RepositoryError::Timeout(Duration::from_secs(1))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LifecycleError::InvalidInput("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                LifecycleError::Repository(RepositoryError::NotFound {
                    collection: collection::COMPLETED,
                    id: "a".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                LifecycleError::Repository(RepositoryError::QueryFailed("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::read(err).status(), expected);
        }
    }

    #[test]
    fn test_write_mapping() {
        let cases = [
            (
                LifecycleError::InvalidInput("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (LifecycleError::NoBackup, StatusCode::INTERNAL_SERVER_ERROR),
            (
                LifecycleError::Submission(RepositoryError::QueryFailed("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                LifecycleError::Connection(RepositoryError::ConnectionFailed("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::write(err).status(), expected);
        }
    }
}
