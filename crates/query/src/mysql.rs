//! MySQL executor — the production transport database.

use crate::decode::{self, decode_error, map_sqlx_error};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use relaybot_config::DatabaseConfig;
use relaybot_core::error::QueryError;
use relaybot_core::query::{QueryExecutor, Row};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Connection options built field by field, so credentials never pass
/// through URL parsing.
fn parts_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new().port(config.port);
    if let Some(host) = &config.host {
        options = options.host(host);
    }
    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    if let Some(name) = &config.name {
        options = options.database(name);
    }
    options
}

pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Create a pool that opens connections on first use.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self, QueryError> {
        let options = MySqlConnectOptions::from_str(url)
            .map_err(|e| QueryError::Connection(format!("Invalid MySQL URL: {e}")))?;
        Ok(Self::connect_lazy_with(options, max_connections))
    }

    /// Like [`connect_lazy`](Self::connect_lazy), from `DB_*` style parts.
    pub fn connect_lazy_from_parts(config: &DatabaseConfig) -> Self {
        Self::connect_lazy_with(parts_options(config), config.max_connections)
    }

    fn connect_lazy_with(options: MySqlConnectOptions, max_connections: u32) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(options);
        Self { pool }
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for MySqlExecutor {
    fn name(&self) -> &str {
        "mysql"
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        debug!(sql, "Executing MySQL query");
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

fn row_to_json(row: &MySqlRow) -> Result<Row, QueryError> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx).map_err(|e| decode_error(column.name(), e))?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn column_value(row: &MySqlRow, idx: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Value::from(row.try_get_unchecked::<i64, _>(idx)?)
        }
        t if t.ends_with("UNSIGNED") || t == "BIT" => {
            Value::from(row.try_get_unchecked::<u64, _>(idx)?)
        }
        "FLOAT" => decode::float(f64::from(row.try_get::<f32, _>(idx)?)),
        "DOUBLE" => decode::float(row.try_get::<f64, _>(idx)?),
        "DECIMAL" => decode::decimal(row.try_get_unchecked::<String, _>(idx)?),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "TIME" => Value::String(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        "DATETIME" => Value::String(
            row.try_get::<NaiveDateTime, _>(idx)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "TIMESTAMP" => Value::String(row.try_get::<DateTime<Utc>, _>(idx)?.to_rfc3339()),
        "JSON" => {
            let text = row.try_get_unchecked::<String, _>(idx)?;
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        t if t.contains("BINARY") || t.contains("BLOB") => {
            decode::bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?)
        }
        _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_a_connection_error() {
        let result = MySqlExecutor::connect_lazy("mysql://bot@db:notaport/transport", 2);
        assert!(matches!(result, Err(QueryError::Connection(_))));
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect_up_front() {
        let executor = MySqlExecutor::connect_lazy("mysql://bot:pw@127.0.0.1:1/transport", 2)
            .unwrap();
        assert_eq!(executor.name(), "mysql");
    }

    fn parts_with_password(password: &str) -> DatabaseConfig {
        DatabaseConfig {
            host: Some("db.internal".into()),
            user: Some("bot".into()),
            password: Some(password.into()),
            name: Some("transport".into()),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn parts_keep_host_and_database_with_awkward_password() {
        let options = parts_options(&parts_with_password("p@ss/w#rd"));
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 3306);
        assert_eq!(options.get_username(), "bot");
        assert_eq!(options.get_database(), Some("transport"));
    }

    #[test]
    fn encoded_connection_url_parses_to_same_target() {
        let url = parts_with_password("p@ss/w#rd:?").connection_url().unwrap();
        let options = MySqlConnectOptions::from_str(&url).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_username(), "bot");
        assert_eq!(options.get_database(), Some("transport"));
    }
}
