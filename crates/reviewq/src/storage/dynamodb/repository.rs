//! DynamoDB repository implementation.
//!
//! Implements the repository traits from `reviewq_core::storage` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeValue, DeleteRequest, PutRequest, ReturnValue, Select, WriteRequest,
};
use aws_sdk_dynamodb::Client;

use reviewq_core::review::{CompletedReview, ItemId, ReviewItem};
use reviewq_core::storage::{
    collection, BackupRepository, CompletedRepository, PendingRepository, RepositoryError,
    Result, ReviewStore,
};

use super::conversions::{
    backup_to_item, completed_to_item, item_to_backup, item_to_completed, item_to_pending,
    pending_to_item, primary_key, Item,
};
use super::error::{
    map_batch_write_error, map_delete_item_error, map_describe_table_error, map_put_item_error,
    map_query_error,
};
use super::keys;
use crate::config::Collections;

/// BatchWriteItem accepts at most 25 requests.
const BATCH_SIZE: usize = 25;
/// Rounds spent resubmitting unprocessed batch items before giving up.
const MAX_BATCH_ATTEMPTS: usize = 5;

/// Options for a single-partition query.
#[derive(Debug, Clone, Copy, Default)]
struct PartitionQuery<'a> {
    newest_first: bool,
    review_id: Option<&'a str>,
    limit: Option<usize>,
}

/// DynamoDB-based repository implementation.
///
/// One table per logical database; each collection is one partition.
pub struct DynamoDbRepository {
    client: Client,
    table_name: String,
    collections: Collections,
}

impl DynamoDbRepository {
    /// Creates a new repository with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>, collections: Collections) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            collections,
        }
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Reads a whole partition, following pagination until `limit` is reached.
    async fn query_items(&self, pk: &str, options: PartitionQuery<'_>) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#pk = :pk")
                .expression_attribute_names("#pk", keys::PK)
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .scan_index_forward(!options.newest_first)
                .set_exclusive_start_key(start_key);

            if let Some(review_id) = options.review_id {
                request = request
                    .filter_expression("#rid = :rid")
                    .expression_attribute_names("#rid", keys::REVIEW_ID)
                    .expression_attribute_values(":rid", AttributeValue::S(review_id.to_string()));
            }

            let output = request.send().await.map_err(map_query_error)?;
            items.extend(output.items.unwrap_or_default());

            if let Some(limit) = options.limit {
                if items.len() >= limit {
                    items.truncate(limit);
                    break;
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn count_items(&self, pk: &str) -> Result<u64> {
        let mut total = 0u64;
        let mut start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#pk = :pk")
                .expression_attribute_names("#pk", keys::PK)
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .select(Select::Count)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            total += output.count.max(0) as u64;

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(total)
    }

    /// Submits write requests in batches, resubmitting unprocessed items.
    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<()> {
        for chunk in requests.chunks(BATCH_SIZE) {
            let mut remaining = chunk.to_vec();
            let mut attempts = 0;

            while !remaining.is_empty() {
                attempts += 1;
                if attempts > MAX_BATCH_ATTEMPTS {
                    return Err(RepositoryError::QueryFailed(format!(
                        "{} writes still unprocessed after {MAX_BATCH_ATTEMPTS} attempts",
                        remaining.len()
                    )));
                }

                let output = self
                    .client
                    .batch_write_item()
                    .request_items(&self.table_name, remaining)
                    .send()
                    .await
                    .map_err(map_batch_write_error)?;

                remaining = output
                    .unprocessed_items
                    .and_then(|mut unprocessed| unprocessed.remove(&self.table_name))
                    .unwrap_or_default();
            }
        }

        Ok(())
    }

    /// Deletes every item in a partition and returns how many were removed.
    async fn clear_partition(&self, pk: &str) -> Result<u64> {
        let existing = self.query_items(pk, PartitionQuery::default()).await?;
        let removed = existing.len() as u64;

        let deletes = existing
            .iter()
            .map(|attrs| -> Result<WriteRequest> { delete_request(primary_key(attrs)?) })
            .collect::<Result<Vec<_>>>()?;
        self.batch_write(deletes).await?;

        Ok(removed)
    }
}

fn put_request(item: Item) -> Result<WriteRequest> {
    let put = PutRequest::builder()
        .set_item(Some(item))
        .build()
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    Ok(WriteRequest::builder().put_request(put).build())
}

fn delete_request(key: Item) -> Result<WriteRequest> {
    let delete = DeleteRequest::builder()
        .set_key(Some(key))
        .build()
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    Ok(WriteRequest::builder().delete_request(delete).build())
}

// ============================================================================
// PendingRepository implementation
// ============================================================================

#[async_trait]
impl PendingRepository for DynamoDbRepository {
    async fn list_pending(&self, limit: usize) -> Result<Vec<ReviewItem>> {
        // Sort keys follow the item id, so insertion order is restored from `seq`.
        let items = self
            .query_items(&self.collections.pending, PartitionQuery::default())
            .await?;

        let mut pending = items
            .iter()
            .map(item_to_pending)
            .collect::<Result<Vec<_>>>()?;
        pending.sort_by_key(|(seq, _)| *seq);

        Ok(pending
            .into_iter()
            .take(limit)
            .map(|(_, item)| item)
            .collect())
    }

    async fn first_pending(&self) -> Result<Option<ReviewItem>> {
        Ok(self.list_pending(1).await?.into_iter().next())
    }

    async fn count_pending(&self) -> Result<u64> {
        self.count_items(&self.collections.pending).await
    }

    async fn delete_pending(&self, id: &ItemId) -> Result<bool> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(keys::PK, AttributeValue::S(self.collections.pending.clone()))
            .key(keys::SK, AttributeValue::S(keys::pending_sk(id)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(output.attributes.is_some_and(|attrs| !attrs.is_empty()))
    }

    async fn replace_pending(&self, items: &[ReviewItem]) -> Result<u64> {
        let pk = &self.collections.pending;
        let puts = items
            .iter()
            .enumerate()
            .map(|(seq, item)| -> Result<WriteRequest> {
                put_request(pending_to_item(pk, item, seq as u64)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let removed = self.clear_partition(pk).await?;
        self.batch_write(puts).await?;

        Ok(removed)
    }
}

// ============================================================================
// CompletedRepository implementation
// ============================================================================

#[async_trait]
impl CompletedRepository for DynamoDbRepository {
    async fn insert_completed(&self, review: &CompletedReview) -> Result<()> {
        let item = completed_to_item(&self.collections.completed, review)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| map_put_item_error(e, collection::COMPLETED, review.doc_id()))?;

        Ok(())
    }

    async fn list_completed(&self, limit: Option<usize>) -> Result<Vec<CompletedReview>> {
        let options = PartitionQuery {
            newest_first: true,
            limit,
            ..Default::default()
        };
        let items = self
            .query_items(&self.collections.completed, options)
            .await?;

        items.iter().map(item_to_completed).collect()
    }

    async fn find_completed(&self, review_id: &ItemId) -> Result<Option<CompletedReview>> {
        let options = PartitionQuery {
            newest_first: true,
            review_id: Some(review_id.as_str()),
            limit: Some(1),
        };
        let items = self
            .query_items(&self.collections.completed, options)
            .await?;

        items.first().map(item_to_completed).transpose()
    }

    async fn count_completed(&self) -> Result<u64> {
        self.count_items(&self.collections.completed).await
    }
}

// ============================================================================
// BackupRepository implementation
// ============================================================================

#[async_trait]
impl BackupRepository for DynamoDbRepository {
    async fn load_backup(&self) -> Result<Vec<ReviewItem>> {
        let items = self
            .query_items(&self.collections.backup, PartitionQuery::default())
            .await?;

        items.iter().map(item_to_backup).collect()
    }

    async fn replace_backup(&self, items: &[ReviewItem]) -> Result<()> {
        let pk = &self.collections.backup;
        let puts = items
            .iter()
            .enumerate()
            .map(|(seq, item)| -> Result<WriteRequest> {
                put_request(backup_to_item(pk, item, seq as u64)?)
            })
            .collect::<Result<Vec<_>>>()?;

        self.clear_partition(pk).await?;
        self.batch_write(puts).await
    }
}

#[async_trait]
impl ReviewStore for DynamoDbRepository {
    async fn ping(&self) -> Result<()> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| map_describe_table_error(e, &self.table_name))?;

        Ok(())
    }
}
