//! In-memory repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reviewq_core::review::{compare_completed, CompletedReview, ItemId, ReviewItem};
use reviewq_core::storage::{
    collection, BackupRepository, CompletedRepository, PendingRepository, RepositoryError,
    Result, ReviewStore,
};

/// In-memory storage backend.
///
/// Each collection is a `Vec` behind its own `Arc<RwLock<_>>`, so clones share
/// data. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    pending: Arc<RwLock<Vec<ReviewItem>>>,
    completed: Arc<RwLock<Vec<CompletedReview>>>,
    backup: Arc<RwLock<Vec<ReviewItem>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingRepository for InMemoryRepository {
    async fn list_pending(&self, limit: usize) -> Result<Vec<ReviewItem>> {
        let pending = self.pending.read().await;
        Ok(pending.iter().take(limit).cloned().collect())
    }

    async fn first_pending(&self) -> Result<Option<ReviewItem>> {
        let pending = self.pending.read().await;
        Ok(pending.first().cloned())
    }

    async fn count_pending(&self) -> Result<u64> {
        Ok(self.pending.read().await.len() as u64)
    }

    async fn delete_pending(&self, id: &ItemId) -> Result<bool> {
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|item| item.id() != id);
        Ok(pending.len() != before)
    }

    async fn replace_pending(&self, items: &[ReviewItem]) -> Result<u64> {
        let mut pending = self.pending.write().await;
        let removed = pending.len() as u64;
        *pending = items.to_vec();
        Ok(removed)
    }
}

#[async_trait]
impl CompletedRepository for InMemoryRepository {
    async fn insert_completed(&self, review: &CompletedReview) -> Result<()> {
        let mut completed = self.completed.write().await;
        if completed.iter().any(|r| r.doc_id() == review.doc_id()) {
            return Err(RepositoryError::AlreadyExists {
                collection: collection::COMPLETED,
                id: review.doc_id().to_string(),
            });
        }
        completed.push(review.clone());
        Ok(())
    }

    async fn list_completed(&self, limit: Option<usize>) -> Result<Vec<CompletedReview>> {
        let mut reviews = self.completed.read().await.clone();
        reviews.sort_by(compare_completed);
        if let Some(limit) = limit {
            reviews.truncate(limit);
        }
        Ok(reviews)
    }

    async fn find_completed(&self, review_id: &ItemId) -> Result<Option<CompletedReview>> {
        let completed = self.completed.read().await;
        Ok(completed
            .iter()
            .filter(|r| r.review_id() == Some(review_id))
            .min_by(|a, b| compare_completed(a, b))
            .cloned())
    }

    async fn count_completed(&self) -> Result<u64> {
        Ok(self.completed.read().await.len() as u64)
    }
}

#[async_trait]
impl BackupRepository for InMemoryRepository {
    async fn load_backup(&self) -> Result<Vec<ReviewItem>> {
        Ok(self.backup.read().await.clone())
    }

    async fn replace_backup(&self, items: &[ReviewItem]) -> Result<()> {
        *self.backup.write().await = items.to_vec();
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for InMemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use reviewq_core::review::Verdict;
    use serde_json::json;
    use uuid::Uuid;

    fn item(id: &str) -> ReviewItem {
        ReviewItem::try_from(json!({"id": id, "prompt": format!("prompt {id}")})).unwrap()
    }

    fn completed(review_id: &str, second: u32) -> CompletedReview {
        let verdict = Verdict::try_from(json!({"review_id": review_id})).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap();
        CompletedReview::record(verdict, Uuid::new_v4(), at)
    }

    #[tokio::test]
    async fn test_pending_keeps_insertion_order() {
        let repo = InMemoryRepository::new();
        repo.replace_pending(&[item("b"), item("a"), item("c")])
            .await
            .unwrap();

        let ids: Vec<String> = repo
            .list_pending(10)
            .await
            .unwrap()
            .iter()
            .map(|i| i.id().to_string())
            .collect();

        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(
            repo.first_pending().await.unwrap().unwrap().id().as_str(),
            "b"
        );
    }

    #[tokio::test]
    async fn test_list_pending_respects_limit() {
        let repo = InMemoryRepository::new();
        repo.replace_pending(&[item("a"), item("b"), item("c")])
            .await
            .unwrap();

        assert_eq!(repo.list_pending(2).await.unwrap().len(), 2);
        assert_eq!(repo.count_pending().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_pending_reports_match() {
        let repo = InMemoryRepository::new();
        repo.replace_pending(&[item("a"), item("b")]).await.unwrap();

        assert!(repo.delete_pending(&ItemId::from("a")).await.unwrap());
        assert!(!repo.delete_pending(&ItemId::from("a")).await.unwrap());
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_pending_returns_removed_count() {
        let repo = InMemoryRepository::new();
        repo.replace_pending(&[item("a"), item("b")]).await.unwrap();

        let removed = repo.replace_pending(&[item("c")]).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_completed_listed_newest_first() {
        let repo = InMemoryRepository::new();
        repo.insert_completed(&completed("a", 1)).await.unwrap();
        repo.insert_completed(&completed("b", 3)).await.unwrap();
        repo.insert_completed(&completed("c", 2)).await.unwrap();

        let review_ids: Vec<String> = repo
            .list_completed(Some(2))
            .await
            .unwrap()
            .iter()
            .map(|r| r.review_id().unwrap().to_string())
            .collect();

        assert_eq!(review_ids, vec!["b", "c"]);
        assert_eq!(repo.count_completed().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_completed_rejects_duplicate_doc_id() {
        let repo = InMemoryRepository::new();
        let review = completed("a", 1);
        repo.insert_completed(&review).await.unwrap();

        let err = repo.insert_completed(&review).await.unwrap_err();

        assert_eq!(
            err,
            RepositoryError::AlreadyExists {
                collection: collection::COMPLETED,
                id: review.doc_id().to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_find_completed_returns_latest_match() {
        let repo = InMemoryRepository::new();
        repo.insert_completed(&completed("a", 1)).await.unwrap();
        let latest = completed("a", 9);
        repo.insert_completed(&latest).await.unwrap();
        repo.insert_completed(&completed("b", 5)).await.unwrap();

        let found = repo
            .find_completed(&ItemId::from("a"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.doc_id(), latest.doc_id());
        assert!(repo
            .find_completed(&ItemId::from("zzz"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_backup_is_independent_of_pending() {
        let repo = InMemoryRepository::new();
        repo.replace_backup(&[item("a"), item("b")]).await.unwrap();
        repo.replace_pending(&[item("a"), item("b")]).await.unwrap();

        repo.delete_pending(&ItemId::from("a")).await.unwrap();

        assert_eq!(repo.load_backup().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let repo = InMemoryRepository::new();
        let clone = repo.clone();

        repo.replace_pending(&[item("a")]).await.unwrap();

        assert_eq!(clone.count_pending().await.unwrap(), 1);
    }
}
