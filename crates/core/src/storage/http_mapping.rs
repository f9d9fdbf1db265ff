//! Pure mapping from repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// Unreachable databases are reported as 503 so the platform's retry policy
/// can re-invoke; everything the caller cannot fix is a 500.
///
/// ```
/// use reviewq_core::storage::{repository_error_to_status_code, RepositoryError};
///
/// let error = RepositoryError::ConnectionFailed("refused".to_string());
/// assert_eq!(repository_error_to_status_code(&error), 503);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::ConnectionFailed(_) | RepositoryError::Timeout(_) => 503,
        RepositoryError::InvalidData(_) => 400,
        RepositoryError::QueryFailed(_) | RepositoryError::Serialization(_) => 500,
    }
}
