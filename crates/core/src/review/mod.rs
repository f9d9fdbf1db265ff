mod analytics;
mod error;
mod operations;
mod requests;
mod types;

pub use analytics::{
    compute_stats, training_examples, FeatureStats, ReviewStats, TrainingExample,
    TrainingMetadata, DEFAULT_MIN_TRAINING_RATING,
};
pub use error::ReviewError;
pub use operations::{
    clamp_limit, compare_completed, numeric_field, project, sort_completed, validate_seed,
};
pub use requests::{
    CompletedPage, ExportQuery, ListCompletedQuery, NextReview, PendingPage, ResetReceipt,
    ResetRequest, SubmitReceipt,
};
pub use types::{
    format_timestamp, parse_timestamp, CompletedReview, Fields, ItemId, Projection, ReviewItem,
    Verdict, DOC_ID_FIELD, ID_FIELD, LARGE_FIELDS, REVIEW_ID_FIELD, SUBMITTED_AT_FIELD,
};
