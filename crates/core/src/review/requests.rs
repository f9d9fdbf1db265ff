//! API request and response shapes for the review lifecycle.
//!
//! Pure data types shared by the handlers and any client of the HTTP surface.

use serde::{Deserialize, Serialize};

use super::types::{Fields, ItemId, Projection, ReviewItem};

/// Query parameters for listing completed reviews.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCompletedQuery {
    #[serde(default)]
    pub view: Projection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Query parameters for the training export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
}

/// Body of a reset request. Reset runs only when `confirm` is `true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Fetch-One result: the next pending item plus queue counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextReview {
    pub item: ReviewItem,
    pub remaining_count: u64,
    pub total_count: u64,
}

/// Fetch-All result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPage {
    pub items: Vec<ReviewItem>,
    /// Pending items in the store, which exceeds `items.len()` when truncated.
    pub total: u64,
    pub truncated: bool,
}

/// List-Completed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedPage {
    pub items: Vec<Fields>,
    pub view: Projection,
}

/// Acknowledgement for a recorded verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub success: bool,
    /// Document id of the new completed review.
    pub id: String,
    /// Whether a matching pending item was removed.
    pub removed_pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<ItemId>,
}

/// Acknowledgement for a reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetReceipt {
    pub success: bool,
    pub removed: u64,
    pub restored: u64,
}
