//! Application state shared by all request handlers.
//!
//! The entry point builds one [`AppState`] per process. It owns the
//! [`ConnectionCache`], so every handler reuses the same database handle.
//! The backend is chosen at compile time via feature flags.

use std::sync::Arc;

use crate::config::Config;
use crate::connection::{ConnectionCache, Connector};

/// Shared application state.
///
/// Cloned for each request handler; clones share the cache and config.
#[derive(Clone)]
pub struct AppState {
    /// Lazily connected database handle.
    pub connections: Arc<ConnectionCache>,
    /// Configuration read once at startup.
    pub config: Arc<Config>,
}

impl AppState {
    fn build(connector: Arc<dyn Connector>, config: Config) -> Self {
        let connect_timeout = config.timeouts.connect;
        Self {
            connections: Arc::new(ConnectionCache::new(connector, connect_timeout)),
            config: Arc::new(config),
        }
    }

    /// Wraps an already-open store.
    #[cfg(test)]
    pub fn with_store(store: Arc<dyn reviewq_core::storage::ReviewStore>, config: Config) -> Self {
        Self {
            connections: Arc::new(ConnectionCache::with_store(store)),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Backend-specific factories
// ============================================================================

#[cfg(feature = "inmemory")]
mod inmemory {
    use super::*;
    use crate::storage::inmemory::InMemoryConnector;

    impl AppState {
        /// Creates AppState backed by process memory.
        pub fn new(config: Config) -> Self {
            Self::build(Arc::new(InMemoryConnector::default()), config)
        }
    }
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crate::storage::sqlite::SqliteConnector;

    impl AppState {
        /// Creates AppState backed by the SQLite file at `Config::sqlite_path`.
        pub fn new(config: Config) -> Self {
            Self::build(Arc::new(SqliteConnector::new(&config)), config)
        }
    }
}

#[cfg(feature = "dynamodb")]
mod dynamodb {
    use super::*;
    use crate::storage::dynamodb::DynamoDbConnector;

    impl AppState {
        /// Creates AppState backed by the DynamoDB table named `database_name`.
        pub fn new(config: Config) -> Self {
            Self::build(Arc::new(DynamoDbConnector::new(&config)), config)
        }
    }
}
