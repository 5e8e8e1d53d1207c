//! Placeholder executor for deployments without a database.

use async_trait::async_trait;
use relaybot_core::error::QueryError;
use relaybot_core::query::{QueryExecutor, Row};

/// Fails every query with [`QueryError::NotConfigured`].
pub struct UnconfiguredExecutor;

#[async_trait]
impl QueryExecutor for UnconfiguredExecutor {
    fn name(&self) -> &str {
        "none"
    }

    async fn execute(&self, _sql: &str) -> Result<Vec<Row>, QueryError> {
        Err(QueryError::NotConfigured)
    }

    async fn health_check(&self) -> Result<bool, QueryError> {
        Ok(false)
    }
}
