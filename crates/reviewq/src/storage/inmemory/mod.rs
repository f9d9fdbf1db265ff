//! In-memory storage backend.
//!
//! Keeps all three collections in process memory. Used by the test suite and
//! for demo runs started with `reviewq serve --seed-file <path>`.

mod repository;

pub use repository::InMemoryRepository;

use std::sync::Arc;

use async_trait::async_trait;
use reviewq_core::storage::{Result, ReviewStore};

use crate::connection::Connector;

/// Connector that hands out one shared in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    repo: InMemoryRepository,
}

#[async_trait]
impl Connector for InMemoryConnector {
    fn backend(&self) -> &'static str {
        "inmemory"
    }

    async fn connect(&self) -> Result<Arc<dyn ReviewStore>> {
        Ok(Arc::new(self.repo.clone()))
    }
}
