use std::cmp::Ordering;
use std::collections::HashSet;

use serde_json::Value;

use super::error::ReviewError;
use super::types::{CompletedReview, Fields, Projection, ReviewItem, LARGE_FIELDS};

/// Orders completed reviews most-recent-first.
///
/// Ties on `submitted_at` break on `_id`, descending, so repeated reads page
/// identically.
pub fn compare_completed(a: &CompletedReview, b: &CompletedReview) -> Ordering {
    b.submitted_at()
        .cmp(&a.submitted_at())
        .then_with(|| b.doc_id().cmp(a.doc_id()))
}

/// Sorts completed reviews in place using [`compare_completed`].
pub fn sort_completed(reviews: &mut [CompletedReview]) {
    reviews.sort_by(compare_completed);
}

/// Applies a projection to a completed review.
pub fn project(review: CompletedReview, projection: Projection) -> Fields {
    let mut fields = review.into_fields();
    if projection == Projection::Summary {
        for key in LARGE_FIELDS {
            fields.remove(key);
        }
    }
    fields
}

/// Resolves a caller-requested bound against the configured default and cap.
///
/// Zero is treated as "not specified".
pub fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    requested
        .filter(|&n| n > 0)
        .unwrap_or(default)
        .min(max)
}

/// Validates a producer batch before it replaces the pending set.
///
/// Every element must be an object with a usable `id`, ids must be unique,
/// and the batch must not be empty.
pub fn validate_seed(documents: Vec<Value>) -> Result<Vec<ReviewItem>, ReviewError> {
    if documents.is_empty() {
        return Err(ReviewError::EmptySeed);
    }

    let mut seen = HashSet::with_capacity(documents.len());
    let mut items = Vec::with_capacity(documents.len());
    for document in documents {
        let item = ReviewItem::try_from(document)?;
        if !seen.insert(item.id().clone()) {
            return Err(ReviewError::DuplicateId(item.id().to_string()));
        }
        items.push(item);
    }
    Ok(items)
}

/// Reads a numeric field, accepting numbers and numeric strings.
pub fn numeric_field(fields: &Fields, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
