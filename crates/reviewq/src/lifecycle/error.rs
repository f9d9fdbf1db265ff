use reviewq_core::review::ReviewError;
use reviewq_core::storage::RepositoryError;
use thiserror::Error;

/// Failures of a lifecycle operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The database could not be reached.
    #[error("Database unavailable: {0}")]
    Connection(RepositoryError),
    /// Nothing to return. An expected state, not a fault.
    #[error("{0}")]
    EmptyResult(&'static str),
    /// The verdict could not be recorded in Completed.
    #[error("Failed to record review: {0}")]
    Submission(RepositoryError),
    /// Reset was requested but no backup snapshot exists.
    #[error("No backup snapshot exists; seed the queue before resetting")]
    NoBackup,
    /// Malformed request input.
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for LifecycleError {
    fn from(err: RepositoryError) -> Self {
        if err.is_connection_error() {
            Self::Connection(err)
        } else {
            Self::Repository(err)
        }
    }
}

impl From<ReviewError> for LifecycleError {
    fn from(err: ReviewError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
