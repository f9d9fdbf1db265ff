//! SQLite storage backend implementation.
//!
//! This module provides a SQLite-based implementation of the repository traits
//! using `rusqlite` for synchronous operations and `tokio-rusqlite` for async wrapping.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::SqliteRepository;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reviewq_core::storage::{Result, ReviewStore};

use crate::config::{Collections, Config};
use crate::connection::Connector;

/// Opens the SQLite database file named by the configuration.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: String,
    collections: Collections,
    busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.sqlite_path(),
            collections: config.collections.clone(),
            busy_timeout: config.timeouts.socket,
        }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn connect(&self) -> Result<Arc<dyn ReviewStore>> {
        tracing::debug!(path = %self.path, "Opening SQLite database");
        let repo = SqliteRepository::new(&self.path, &self.collections, self.busy_timeout).await?;
        Ok(Arc::new(repo))
    }
}
