//! Read-only operations on the completed log.

use reviewq_core::review::{
    clamp_limit, compute_stats, project, training_examples, CompletedPage, CompletedReview,
    ExportQuery, ItemId, ListCompletedQuery, ReviewStats, TrainingExample,
    DEFAULT_MIN_TRAINING_RATING,
};
use reviewq_core::storage::{collection, RepositoryError};

use super::LifecycleError;
use crate::config::Config;
use crate::connection::ConnectionCache;

/// List-Completed: most-recent-first, bounded, with the requested projection.
pub async fn list_completed(
    connections: &ConnectionCache,
    config: &Config,
    query: ListCompletedQuery,
) -> Result<CompletedPage, LifecycleError> {
    let limit = clamp_limit(
        query.limit,
        config.completed_default_limit,
        config.completed_max_limit,
    );
    let store = connections.get().await?;

    let reviews = store.list_completed(Some(limit)).await?;
    if reviews.is_empty() {
        return Err(LifecycleError::EmptyResult("No completed reviews"));
    }

    Ok(CompletedPage {
        items: reviews
            .into_iter()
            .map(|review| project(review, query.view))
            .collect(),
        view: query.view,
    })
}

/// Most recent completed review recorded for a pending item id.
pub async fn find_completed(
    connections: &ConnectionCache,
    review_id: &str,
) -> Result<CompletedReview, LifecycleError> {
    let id = ItemId::from(review_id);
    let store = connections.get().await?;

    store
        .find_completed(&id)
        .await?
        .ok_or_else(|| {
            LifecycleError::Repository(RepositoryError::NotFound {
                collection: collection::COMPLETED,
                id: review_id.to_string(),
            })
        })
}

/// Aggregate statistics over the whole completed log.
pub async fn stats(connections: &ConnectionCache) -> Result<ReviewStats, LifecycleError> {
    let store = connections.get().await?;
    let reviews = store.list_completed(None).await?;
    Ok(compute_stats(&reviews))
}

/// Highly rated reviews shaped as training examples, newest first.
pub async fn export(
    connections: &ConnectionCache,
    query: ExportQuery,
) -> Result<Vec<TrainingExample>, LifecycleError> {
    let min_rating = query.min_rating.unwrap_or(DEFAULT_MIN_TRAINING_RATING);
    if !min_rating.is_finite() {
        return Err(LifecycleError::InvalidInput(
            "min_rating must be a finite number".to_string(),
        ));
    }

    let store = connections.get().await?;
    let reviews = store.list_completed(None).await?;
    let examples = training_examples(&reviews, min_rating);
    tracing::debug!(count = examples.len(), min_rating, "Prepared training export");

    Ok(examples)
}
