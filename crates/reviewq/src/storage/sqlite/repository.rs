//! SQLite repository implementation.
//!
//! Implements the repository traits from `reviewq_core::storage` using SQLite.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rusqlite::params;
use tokio_rusqlite::Connection;

use reviewq_core::review::{CompletedReview, ItemId, ReviewItem};
use reviewq_core::storage::{
    collection, BackupRepository, CompletedRepository, PendingRepository, RepositoryError,
    Result, ReviewStore,
};

use super::conversions::{item_to_doc, review_to_columns, row_to_item, row_to_review};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::schema::Statements;
use crate::config::Collections;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based repository implementation.
///
/// One table per collection, each row holding the full JSON document.
pub struct SqliteRepository {
    conn: Connection,
    sql: Arc<Statements>,
}

impl SqliteRepository {
    /// Opens (or creates) a file-based database and its tables.
    ///
    /// `busy_timeout` bounds how long a statement waits on a locked database.
    pub async fn new(path: &str, collections: &Collections, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init(conn, collections, busy_timeout).await
    }

    /// Creates a repository backed by an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory(collections: &Collections) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init(conn, collections, Duration::from_secs(5)).await
    }

    async fn init(conn: Connection, collections: &Collections, busy_timeout: Duration) -> Result<Self> {
        let sql = Arc::new(Statements::new(collections));
        let create = sql.create_tables.clone();

        conn.call(move |conn| {
            conn.busy_timeout(busy_timeout).map_err(wrap_err)?;
            conn.execute_batch(&create).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Ok(Self { conn, sql })
    }

    async fn count(&self, statement: String, collection: &'static str) -> Result<u64> {
        self.conn
            .call(move |conn| {
                conn.query_row(&statement, [], |row| row.get::<_, i64>(0))
                    .map_err(wrap_err)
            })
            .await
            .map(|n| n.max(0) as u64)
            .map_err(|e| map_tokio_rusqlite_error(e, collection))
    }
}

// ============================================================================
// PendingRepository implementation
// ============================================================================

#[async_trait]
impl PendingRepository for SqliteRepository {
    async fn list_pending(&self, limit: usize) -> Result<Vec<ReviewItem>> {
        let statement = self.sql.select_pending.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&statement).map_err(wrap_err)?;
                let rows = stmt
                    .query_map([limit], row_to_item)
                    .map_err(wrap_err)?;

                let mut items = Vec::new();
                for row_result in rows {
                    items.push(row_result.map_err(wrap_err)?);
                }
                Ok(items)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, collection::PENDING))
    }

    async fn first_pending(&self) -> Result<Option<ReviewItem>> {
        Ok(self.list_pending(1).await?.into_iter().next())
    }

    async fn count_pending(&self) -> Result<u64> {
        self.count(self.sql.count_pending.clone(), collection::PENDING).await
    }

    async fn delete_pending(&self, id: &ItemId) -> Result<bool> {
        let statement = self.sql.delete_pending.clone();
        let id_str = id.as_str().to_string();

        self.conn
            .call(move |conn| {
                let affected = conn.execute(&statement, [&id_str]).map_err(wrap_err)?;
                Ok(affected > 0)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, collection::PENDING, id.as_str()))
    }

    async fn replace_pending(&self, items: &[ReviewItem]) -> Result<u64> {
        let clear = self.sql.clear_pending.clone();
        let insert = self.sql.insert_pending.clone();
        let rows = items
            .iter()
            .map(|item| -> Result<(String, String)> {
                Ok((item.id().as_str().to_string(), item_to_doc(item)?))
            })
            .collect::<Result<Vec<_>>>()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let removed = tx.execute(&clear, []).map_err(wrap_err)?;
                {
                    let mut stmt = tx.prepare(&insert).map_err(wrap_err)?;
                    for (id, doc) in &rows {
                        stmt.execute(params![id, doc]).map_err(wrap_err)?;
                    }
                }
                tx.commit().map_err(wrap_err)?;
                Ok(removed as u64)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, collection::PENDING))
    }
}

// ============================================================================
// CompletedRepository implementation
// ============================================================================

#[async_trait]
impl CompletedRepository for SqliteRepository {
    async fn insert_completed(&self, review: &CompletedReview) -> Result<()> {
        let statement = self.sql.insert_completed.clone();
        let (doc_id, review_id, submitted_at, doc) = review_to_columns(review)?;
        let id_for_error = doc_id.clone();

        self.conn
            .call(move |conn| {
                conn.execute(&statement, params![doc_id, review_id, submitted_at, doc])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, collection::COMPLETED, id_for_error))
    }

    async fn list_completed(&self, limit: Option<usize>) -> Result<Vec<CompletedReview>> {
        let statement = self.sql.select_completed.clone();
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&statement).map_err(wrap_err)?;
                let rows = stmt
                    .query_map([limit], row_to_review)
                    .map_err(wrap_err)?;

                let mut reviews = Vec::new();
                for row_result in rows {
                    reviews.push(row_result.map_err(wrap_err)?);
                }
                Ok(reviews)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, collection::COMPLETED))
    }

    async fn find_completed(&self, review_id: &ItemId) -> Result<Option<CompletedReview>> {
        let statement = self.sql.select_completed_by_review.clone();
        let id_str = review_id.as_str().to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&statement).map_err(wrap_err)?;
                match stmt.query_row([&id_str], row_to_review) {
                    Ok(review) => Ok(Some(review)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error_with_id(e, collection::COMPLETED, review_id.as_str())
            })
    }

    async fn count_completed(&self) -> Result<u64> {
        self.count(self.sql.count_completed.clone(), collection::COMPLETED).await
    }
}

// ============================================================================
// BackupRepository implementation
// ============================================================================

#[async_trait]
impl BackupRepository for SqliteRepository {
    async fn load_backup(&self) -> Result<Vec<ReviewItem>> {
        let statement = self.sql.select_backup.clone();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&statement).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_item).map_err(wrap_err)?;

                let mut items = Vec::new();
                for row_result in rows {
                    items.push(row_result.map_err(wrap_err)?);
                }
                Ok(items)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, collection::BACKUP))
    }

    async fn replace_backup(&self, items: &[ReviewItem]) -> Result<()> {
        let clear = self.sql.clear_backup.clone();
        let insert = self.sql.insert_backup.clone();
        let docs = items
            .iter()
            .map(item_to_doc)
            .collect::<serde_json::Result<Vec<_>>>()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(&clear, []).map_err(wrap_err)?;
                {
                    let mut stmt = tx.prepare(&insert).map_err(wrap_err)?;
                    for doc in &docs {
                        stmt.execute([doc]).map_err(wrap_err)?;
                    }
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, collection::BACKUP))
    }
}

#[async_trait]
impl ReviewStore for SqliteRepository {
    async fn ping(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
    }
}
