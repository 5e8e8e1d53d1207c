//! SQL query executors for RelayBot.
//!
//! The classifier produces a literal SQL string for data questions; an
//! executor runs it and returns the rows as JSON objects. The backend is
//! picked from the database URL scheme.

mod decode;
pub mod mysql;
pub mod sqlite;
pub mod unconfigured;

pub use mysql::MySqlExecutor;
pub use sqlite::SqliteExecutor;
pub use unconfigured::UnconfiguredExecutor;

use relaybot_config::{DatabaseConfig, redact_url};
use relaybot_core::error::QueryError;
use relaybot_core::query::QueryExecutor;
use relaybot_security::GuardedExecutor;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the executor described by `[database]`.
///
/// Connections are opened lazily, so an unreachable database surfaces on
/// the first query rather than at startup.
pub fn connect(config: &DatabaseConfig) -> Result<Arc<dyn QueryExecutor>, QueryError> {
    let Some(url) = config.connection_url() else {
        warn!("No database configured; data questions will fail");
        return Ok(Arc::new(UnconfiguredExecutor));
    };

    let executor: Arc<dyn QueryExecutor> = if config.uses_parts() {
        Arc::new(MySqlExecutor::connect_lazy_from_parts(config))
    } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
        Arc::new(MySqlExecutor::connect_lazy(&url, config.max_connections)?)
    } else if url.starts_with("sqlite:") {
        Arc::new(SqliteExecutor::connect_lazy(&url, config.max_connections)?)
    } else {
        return Err(QueryError::Connection(format!(
            "unsupported database URL '{}'",
            redact_url(&url)
        )));
    };

    info!(
        backend = executor.name(),
        url = %redact_url(&url),
        read_only = config.read_only,
        "Query executor ready"
    );

    if config.read_only {
        Ok(Arc::new(GuardedExecutor::new(executor)))
    } else {
        Ok(executor)
    }
}
