use thiserror::Error;

/// Errors raised while validating review documents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Document must be a JSON object")]
    NotAnObject,
    #[error("Document is missing an `id` field")]
    MissingId,
    #[error("Invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Duplicate pending id: {0}")]
    DuplicateId(String),
    #[error("Seed input contains no documents")]
    EmptySeed,
}
