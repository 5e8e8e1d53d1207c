//! SQLite executor — local development and tests.
//!
//! SQLite values carry their own storage class, so decoding follows the
//! value rather than the declared column type. The one exception is
//! `BOOLEAN` columns, whose integers are reported as JSON booleans.

use crate::decode::{self, decode_error, map_sqlx_error};
use async_trait::async_trait;
use relaybot_core::error::QueryError;
use relaybot_core::query::{QueryExecutor, Row};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Create a pool that opens connections on first use.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self, QueryError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| QueryError::Connection(format!("Invalid SQLite URL: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        debug!(sql, "Executing SQLite query");
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(row_to_json).collect()
    }

    async fn health_check(&self) -> Result<bool, QueryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(true)
    }
}

fn row_to_json(row: &SqliteRow) -> Result<Row, QueryError> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let declared_bool = column.type_info().name().eq_ignore_ascii_case("BOOLEAN");
        let value =
            column_value(row, idx, declared_bool).map_err(|e| decode_error(column.name(), e))?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn column_value(row: &SqliteRow, idx: usize, declared_bool: bool) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "INTEGER" if declared_bool => Value::Bool(row.try_get_unchecked::<i64, _>(idx)? != 0),
        "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" => decode::float(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => decode::bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}
