//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and domain types.
//! Documents are stored whole as JSON in the `doc` attribute; the remaining
//! attributes exist only for keys and ordering.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use reviewq_core::review::{CompletedReview, ReviewItem};
use reviewq_core::storage::RepositoryError;
use serde_json::Value;

use super::keys;

pub type Item = HashMap<String, AttributeValue>;

// ============================================================================
// Pending conversions
// ============================================================================

/// Convert a pending item to a DynamoDB item at position `seq`.
pub fn pending_to_item(pk: &str, item: &ReviewItem, seq: u64) -> Result<Item, RepositoryError> {
    let mut attrs = HashMap::new();
    attrs.insert(keys::PK.to_string(), AttributeValue::S(pk.to_string()));
    attrs.insert(
        keys::SK.to_string(),
        AttributeValue::S(keys::pending_sk(item.id())),
    );
    attrs.insert(keys::SEQ.to_string(), AttributeValue::N(seq.to_string()));
    attrs.insert(
        keys::DOC.to_string(),
        AttributeValue::S(serde_json::to_string(item.fields())?),
    );
    Ok(attrs)
}

/// Convert a DynamoDB item back to `(seq, item)`.
pub fn item_to_pending(attrs: &Item) -> Result<(u64, ReviewItem), RepositoryError> {
    let seq = get_u64(attrs, keys::SEQ)?;
    Ok((seq, ReviewItem::try_from(get_doc(attrs)?)?))
}

// ============================================================================
// Backup conversions
// ============================================================================

/// Convert a snapshot item to a DynamoDB item at position `seq`.
pub fn backup_to_item(pk: &str, item: &ReviewItem, seq: u64) -> Result<Item, RepositoryError> {
    let mut attrs = HashMap::new();
    attrs.insert(keys::PK.to_string(), AttributeValue::S(pk.to_string()));
    attrs.insert(keys::SK.to_string(), AttributeValue::S(keys::backup_sk(seq)));
    attrs.insert(
        keys::DOC.to_string(),
        AttributeValue::S(serde_json::to_string(item.fields())?),
    );
    Ok(attrs)
}

/// Convert a DynamoDB item to a snapshot item.
pub fn item_to_backup(attrs: &Item) -> Result<ReviewItem, RepositoryError> {
    Ok(ReviewItem::try_from(get_doc(attrs)?)?)
}

// ============================================================================
// Completed conversions
// ============================================================================

/// Convert a completed review to a DynamoDB item.
pub fn completed_to_item(pk: &str, review: &CompletedReview) -> Result<Item, RepositoryError> {
    let mut attrs = HashMap::new();
    attrs.insert(keys::PK.to_string(), AttributeValue::S(pk.to_string()));
    attrs.insert(
        keys::SK.to_string(),
        AttributeValue::S(keys::completed_sk(&review.submitted_at(), review.doc_id())),
    );
    if let Some(review_id) = review.review_id() {
        attrs.insert(
            keys::REVIEW_ID.to_string(),
            AttributeValue::S(review_id.to_string()),
        );
    }
    attrs.insert(
        keys::DOC.to_string(),
        AttributeValue::S(serde_json::to_string(review.fields())?),
    );
    Ok(attrs)
}

/// Convert a DynamoDB item to a completed review.
pub fn item_to_completed(attrs: &Item) -> Result<CompletedReview, RepositoryError> {
    Ok(CompletedReview::try_from(get_doc(attrs)?)?)
}

/// Extract just the primary key of an item.
pub fn primary_key(attrs: &Item) -> Result<Item, RepositoryError> {
    let mut key = HashMap::new();
    for name in [keys::PK, keys::SK] {
        let value = attrs
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::InvalidData(format!("Missing key attribute: {name}")))?;
        key.insert(name.to_string(), value);
    }
    Ok(key)
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get and parse the JSON document attribute.
fn get_doc(attrs: &Item) -> Result<Value, RepositoryError> {
    let raw = attrs
        .get(keys::DOC)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", keys::DOC)))?;
    Ok(serde_json::from_str(raw)?)
}

/// Get a required numeric attribute.
fn get_u64(attrs: &Item, key: &str) -> Result<u64, RepositoryError> {
    attrs
        .get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {key}")))
}
