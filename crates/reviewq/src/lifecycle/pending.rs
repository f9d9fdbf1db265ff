//! Operations on the pending queue: fetch, submit, reset and seed.

use chrono::{SubsecRound, Utc};
use serde_json::Value;
use uuid::Uuid;

use reviewq_core::review::{
    validate_seed, CompletedReview, NextReview, PendingPage, ResetReceipt, ResetRequest,
    SubmitReceipt, Verdict,
};

use super::LifecycleError;
use crate::connection::ConnectionCache;

/// Fetch-One: the first pending item plus queue counters. Read-only.
pub async fn fetch_one(connections: &ConnectionCache) -> Result<NextReview, LifecycleError> {
    let store = connections.get().await?;

    let item = store
        .first_pending()
        .await?
        .ok_or(LifecycleError::EmptyResult("No pending reviews"))?;
    let remaining_count = store.count_pending().await?;
    let completed_count = store.count_completed().await?;

    Ok(NextReview {
        item,
        remaining_count,
        total_count: remaining_count + completed_count,
    })
}

/// Fetch-All: the pending queue in insertion order, capped at `limit`.
pub async fn fetch_all(
    connections: &ConnectionCache,
    limit: usize,
) -> Result<PendingPage, LifecycleError> {
    let store = connections.get().await?;

    // One extra row tells a full page apart from a truncated one.
    let mut items = store.list_pending(limit.saturating_add(1)).await?;
    let truncated = items.len() > limit;
    items.truncate(limit);
    let total = if truncated {
        store.count_pending().await?
    } else {
        items.len() as u64
    };

    if truncated {
        tracing::warn!(limit, total, "Pending queue exceeds fetch limit, truncating");
    }

    Ok(PendingPage {
        items,
        total,
        truncated,
    })
}

/// Submit: record a verdict in Completed, then remove the pending item it
/// refers to.
///
/// Only the insert can fail the call. The delete is best-effort: a failure is
/// logged and reported as `removed_pending: false`.
pub async fn submit(
    connections: &ConnectionCache,
    body: Value,
) -> Result<SubmitReceipt, LifecycleError> {
    let verdict = Verdict::try_from(body)?;
    if let Some(raw) = verdict.unusable_review_id() {
        tracing::warn!(review_id = %raw, "Unusable review_id, recording review uncorrelated");
    }
    let store = connections.get().await?;

    let review = CompletedReview::record(verdict, Uuid::new_v4(), Utc::now().trunc_subsecs(6));
    store
        .insert_completed(&review)
        .await
        .map_err(LifecycleError::Submission)?;

    let review_id = review.review_id().cloned();
    let removed_pending = match &review_id {
        Some(id) => match store.delete_pending(id).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!(review_id = %id, "No pending item to remove");
                false
            }
            Err(err) => {
                tracing::warn!(review_id = %id, error = %err, "Recorded review but failed to remove pending item");
                false
            }
        },
        None => {
            tracing::debug!(doc_id = %review.doc_id(), "Recorded review without review_id");
            false
        }
    };

    tracing::info!(doc_id = %review.doc_id(), removed_pending, "Review recorded");

    Ok(SubmitReceipt {
        success: true,
        id: review.doc_id().to_string(),
        removed_pending,
        review_id,
    })
}

/// Reset: replace the pending queue with the backup snapshot.
///
/// Runs only on an explicit `{"confirm": true}` request.
pub async fn reset(
    connections: &ConnectionCache,
    request: ResetRequest,
) -> Result<ResetReceipt, LifecycleError> {
    if !request.confirm {
        return Err(LifecycleError::InvalidInput(
            "Reset requires {\"confirm\": true}".to_string(),
        ));
    }

    let store = connections.get().await?;
    let backup = store.load_backup().await?;
    if backup.is_empty() {
        return Err(LifecycleError::NoBackup);
    }

    let removed = store.replace_pending(&backup).await?;
    let restored = backup.len() as u64;
    tracing::info!(removed, restored, "Pending queue reset from backup");

    Ok(ResetReceipt {
        success: true,
        removed,
        restored,
    })
}

/// Outcome of a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Documents now in Pending and in the backup snapshot.
    pub seeded: u64,
    /// Pending documents that were replaced.
    pub replaced: u64,
}

/// Seed: validate a producer batch, then make it both the backup snapshot
/// and the pending queue.
pub async fn seed(
    connections: &ConnectionCache,
    documents: Vec<Value>,
) -> Result<SeedSummary, LifecycleError> {
    let items = validate_seed(documents)?;
    let store = connections.get().await?;

    store.replace_backup(&items).await?;
    let replaced = store.replace_pending(&items).await?;
    let seeded = items.len() as u64;
    tracing::info!(seeded, replaced, "Seeded pending queue and backup snapshot");

    Ok(SeedSummary { seeded, replaced })
}
