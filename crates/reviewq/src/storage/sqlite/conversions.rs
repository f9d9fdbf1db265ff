//! SQLite row conversion functions.
//!
//! Documents are stored as JSON text in a `doc` column. These helpers are
//! pure and testable without a database.

use reviewq_core::review::{format_timestamp, CompletedReview, Fields, ReviewItem};
use rusqlite::Row;
use serde_json::Value;

/// Convert a single-column `doc` row to a pending item.
pub fn row_to_item(row: &Row) -> rusqlite::Result<ReviewItem> {
    let doc: String = row.get(0)?;
    ReviewItem::try_from(parse_doc(&doc)?).map_err(conversion_failure)
}

/// Convert a single-column `doc` row to a completed review.
pub fn row_to_review(row: &Row) -> rusqlite::Result<CompletedReview> {
    let doc: String = row.get(0)?;
    CompletedReview::try_from(parse_doc(&doc)?).map_err(conversion_failure)
}

/// Serialize a pending item as its stored document.
pub fn item_to_doc(item: &ReviewItem) -> serde_json::Result<String> {
    serde_json::to_string(item.fields())
}

/// Column values for one completed review: `(doc_id, review_id, submitted_at, doc)`.
pub fn review_to_columns(
    review: &CompletedReview,
) -> serde_json::Result<(String, Option<String>, String, String)> {
    Ok((
        review.doc_id().to_string(),
        review.review_id().map(|id| id.as_str().to_string()),
        format_timestamp(&review.submitted_at()),
        serde_json::to_string(review.fields())?,
    ))
}

fn parse_doc(doc: &str) -> rusqlite::Result<Fields> {
    match serde_json::from_str::<Value>(doc).map_err(conversion_failure)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(conversion_failure(std::io::Error::other(
            "stored document is not a JSON object",
        ))),
    }
}

fn conversion_failure(
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}
