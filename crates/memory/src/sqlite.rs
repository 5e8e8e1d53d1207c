//! SQLite backend — conversation histories that survive restarts.
//!
//! One table, `exchanges`, holds every recorded turn. After each insert the
//! user's rows beyond the newest `capacity` are deleted, so the table never
//! grows past `capacity` rows per user.

use async_trait::async_trait;
use chrono::Utc;
use relaybot_core::error::MemoryError;
use relaybot_core::memory::{ConversationMemory, Exchange};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A persistent conversation store in a single SQLite file.
pub struct SqliteConversationStore {
    pool: SqlitePool,
    capacity: usize,
}

impl SqliteConversationStore {
    /// Open (or create) the store at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database.
    pub async fn new(path: &str, capacity: usize) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to ":memory:" is a separate database.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool, capacity).await?;
        info!("SQLite conversation store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool, capacity: usize) -> Result<Self, MemoryError> {
        let store = Self {
            pool,
            capacity: capacity.max(1),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exchanges (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL,
                user_text   TEXT NOT NULL,
                bot_text    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("exchanges table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_exchanges_user ON exchanges(user_id, id)")
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::MigrationFailed(format!("user index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }
}

#[async_trait]
impl ConversationMemory for SqliteConversationStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn record(&self, user_id: &str, exchange: Exchange) -> Result<(), MemoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MemoryError::Storage(format!("begin: {e}")))?;

        sqlx::query(
            "INSERT INTO exchanges (user_id, user_text, bot_text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&exchange.user)
        .bind(&exchange.bot)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("insert exchange: {e}")))?;

        sqlx::query(
            r#"
            DELETE FROM exchanges
            WHERE user_id = ?1
              AND id NOT IN (
                SELECT id FROM exchanges WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2
              )
            "#,
        )
        .bind(user_id)
        .bind(self.capacity as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("trim history: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| MemoryError::Storage(format!("commit: {e}")))?;
        Ok(())
    }

    async fn history(&self, user_id: &str) -> Result<Vec<Exchange>, MemoryError> {
        let rows = sqlx::query(
            r#"
            SELECT user_text, bot_text FROM (
                SELECT id, user_text, bot_text FROM exchanges
                WHERE user_id = ? ORDER BY id DESC LIMIT ?
            ) ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .bind(self.capacity as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("load history: {e}")))?;

        rows.iter()
            .map(|row| {
                let user: String = row
                    .try_get("user_text")
                    .map_err(|e| MemoryError::QueryFailed(format!("user_text column: {e}")))?;
                let bot: String = row
                    .try_get("bot_text")
                    .map_err(|e| MemoryError::QueryFailed(format!("bot_text column: {e}")))?;
                Ok(Exchange { user, bot })
            })
            .collect()
    }

    async fn forget(&self, user_id: &str) -> Result<bool, MemoryError> {
        let result = sqlx::query("DELETE FROM exchanges WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("forget: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}
