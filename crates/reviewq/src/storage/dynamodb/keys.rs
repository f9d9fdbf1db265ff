//! DynamoDB key generation functions.
//!
//! Everything lives in one table named after the logical database. The
//! partition key is the collection name; the sort key depends on the
//! collection. All functions are sync and have no side effects.

use chrono::{DateTime, Utc};
use reviewq_core::review::{format_timestamp, ItemId};

// ============================================================================
// Attribute names
// ============================================================================

pub const PK: &str = "PK";
pub const SK: &str = "SK";
/// Full JSON document.
pub const DOC: &str = "doc";
/// Insertion position of a pending item.
pub const SEQ: &str = "seq";
/// Correlation id of a completed review, absent when uncorrelated.
pub const REVIEW_ID: &str = "reviewId";

pub const ITEM_PREFIX: &str = "ITEM#";

// ============================================================================
// Sort keys
// ============================================================================

/// Sort key of a pending item.
///
/// Pattern: `ITEM#<id>`, so delete-by-id is a single `DeleteItem`.
pub fn pending_sk(id: &ItemId) -> String {
    format!("{ITEM_PREFIX}{id}")
}

/// Sort key of a backup item.
///
/// Pattern: `ITEM#<seq>` zero-padded to 20 digits, so key order is snapshot order.
pub fn backup_sk(seq: u64) -> String {
    format!("{ITEM_PREFIX}{seq:020}")
}

/// Sort key of a completed review.
///
/// Pattern: `<submitted_at>#<_id>`. Timestamps are fixed-width UTC, so a
/// descending query yields newest first with ties broken by `_id` descending.
pub fn completed_sk(submitted_at: &DateTime<Utc>, doc_id: &str) -> String {
    format!("{}#{doc_id}", format_timestamp(submitted_at))
}
