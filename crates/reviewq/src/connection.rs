//! Process-lifetime database handle.
//!
//! The cache connects lazily on first use and hands the same handle to every
//! later caller in this process. Failed attempts are not remembered: the error
//! goes straight back to the caller and the next call starts a fresh attempt.
//! The handle is never closed explicitly; it lives until the process exits.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use reviewq_core::storage::{RepositoryError, Result, ReviewStore};

/// Opens a new handle to the configured database.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Performs the handshake and returns a ready store.
    async fn connect(&self) -> Result<Arc<dyn ReviewStore>>;
}

/// Holds at most one live [`ReviewStore`] handle.
pub struct ConnectionCache {
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    handle: OnceCell<Arc<dyn ReviewStore>>,
}

impl ConnectionCache {
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            connect_timeout,
            handle: OnceCell::new(),
        }
    }

    /// Wraps an already-open store, e.g. an in-memory one in tests.
    #[cfg(test)]
    pub fn with_store(store: Arc<dyn ReviewStore>) -> Self {
        Self {
            connector: Arc::new(FixedConnector(store.clone())),
            connect_timeout: Duration::from_secs(10),
            handle: OnceCell::new_with(Some(store)),
        }
    }

    /// Returns the cached handle, connecting first if needed.
    ///
    /// Concurrent first calls share one handshake.
    pub async fn get(&self) -> Result<Arc<dyn ReviewStore>> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let backend = self.connector.backend();
                tracing::info!(backend, timeout = ?self.connect_timeout, "Opening database connection");

                match tokio::time::timeout(self.connect_timeout, self.connector.connect()).await {
                    Ok(Ok(store)) => {
                        tracing::info!(backend, "Database connection ready");
                        Ok(store)
                    }
                    Ok(Err(err)) => {
                        tracing::error!(backend, error = %err, "Database connection failed");
                        Err(match err {
                            RepositoryError::Timeout(_) | RepositoryError::ConnectionFailed(_) => {
                                err
                            }
                            other => RepositoryError::ConnectionFailed(other.to_string()),
                        })
                    }
                    Err(_) => {
                        tracing::error!(backend, timeout = ?self.connect_timeout, "Database connection timed out");
                        Err(RepositoryError::Timeout(self.connect_timeout))
                    }
                }
            })
            .await?;

        Ok(handle.clone())
    }

    /// True once a handle has been established.
    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }
}

#[cfg(test)]
struct FixedConnector(Arc<dyn ReviewStore>);

#[cfg(test)]
#[async_trait]
impl Connector for FixedConnector {
    fn backend(&self) -> &'static str {
        "fixed"
    }

    async fn connect(&self) -> Result<Arc<dyn ReviewStore>> {
        Ok(self.0.clone())
    }
}
