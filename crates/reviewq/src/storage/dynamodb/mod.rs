//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the repository traits
//! using `aws-sdk-dynamodb`.

mod conversions;
mod error;
mod keys;
mod repository;

pub use repository::DynamoDbRepository;

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use reviewq_core::storage::{Result, ReviewStore};

use crate::config::Config;
use crate::connection::Connector;

/// Builds a DynamoDB client from the default AWS credential chain.
///
/// `DATABASE_URL`, when set, overrides the endpoint (e.g. DynamoDB Local).
#[derive(Debug, Clone)]
pub struct DynamoDbConnector {
    config: Config,
}

impl DynamoDbConnector {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Connector for DynamoDbConnector {
    fn backend(&self) -> &'static str {
        "dynamodb"
    }

    async fn connect(&self) -> Result<Arc<dyn ReviewStore>> {
        let timeouts = self.config.timeouts;
        let timeout_config = TimeoutConfig::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.socket)
            .operation_attempt_timeout(timeouts.server_selection)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeout_config)
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &self.config.database_url {
            tracing::debug!(endpoint = %endpoint, "Using DynamoDB endpoint override");
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let repo = DynamoDbRepository::new(
            Client::new(&sdk_config),
            &self.config.database_name,
            self.config.collections.clone(),
        );
        repo.ping().await?;
        tracing::debug!(table = %repo.table_name(), "DynamoDB table reachable");

        Ok(Arc::new(repo))
    }
}
