use async_trait::async_trait;

use crate::review::{CompletedReview, ItemId, ReviewItem};

use super::Result;

/// The mutable work queue of items awaiting a verdict.
///
/// Items come back in producer insertion order.
#[async_trait]
pub trait PendingRepository: Send + Sync {
    /// Returns at most `limit` pending items.
    async fn list_pending(&self, limit: usize) -> Result<Vec<ReviewItem>>;

    /// Returns the first pending item, if any.
    async fn first_pending(&self) -> Result<Option<ReviewItem>>;

    /// Counts pending items.
    async fn count_pending(&self) -> Result<u64>;

    /// Deletes the pending item with `id`. Returns `false` when nothing matched.
    async fn delete_pending(&self, id: &ItemId) -> Result<bool>;

    /// Replaces the whole pending set with `items`, returning how many were removed.
    async fn replace_pending(&self, items: &[ReviewItem]) -> Result<u64>;
}

/// The append-only record of submitted verdicts.
#[async_trait]
pub trait CompletedRepository: Send + Sync {
    /// Appends a completed review.
    async fn insert_completed(&self, review: &CompletedReview) -> Result<()>;

    /// Returns completed reviews most-recent-first (tie-break `_id` descending),
    /// bounded by `limit` when given.
    async fn list_completed(&self, limit: Option<usize>) -> Result<Vec<CompletedReview>>;

    /// Returns the most recent completed review whose `review_id` is `review_id`.
    async fn find_completed(&self, review_id: &ItemId) -> Result<Option<CompletedReview>>;

    /// Counts completed reviews.
    async fn count_completed(&self) -> Result<u64>;
}

/// The frozen copy of the pending set taken at seed time.
#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// Returns the snapshot in its original order. Empty means no snapshot.
    async fn load_backup(&self) -> Result<Vec<ReviewItem>>;

    /// Replaces the snapshot.
    async fn replace_backup(&self, items: &[ReviewItem]) -> Result<()>;
}

/// A handle to all three collections of one database.
#[async_trait]
pub trait ReviewStore: PendingRepository + CompletedRepository + BackupRepository {
    /// Cheap round trip proving the database is reachable.
    async fn ping(&self) -> Result<()>;
}
