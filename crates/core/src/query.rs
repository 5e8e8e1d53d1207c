//! Query execution — the relational store behind data questions.
//!
//! The executor receives the literal SQL string produced by the classifier.
//! No parameters are bound on this path.

use async_trait::async_trait;
use crate::error::QueryError;

/// One result row: column name → JSON value, in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The core QueryExecutor trait.
///
/// Implementations: MySQL, SQLite, and an unconfigured placeholder.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The backend name (e.g., "mysql", "sqlite").
    fn name(&self) -> &str;

    /// Run a statement and return its rows in order.
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError>;

    /// Health check — can we reach the database?
    async fn health_check(&self) -> Result<bool, QueryError> {
        Ok(true)
    }
}
