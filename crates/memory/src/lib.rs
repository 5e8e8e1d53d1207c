//! Conversation memory backends for RelayBot.

pub mod noop;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use noop::NoopMemory;
pub use in_memory::InMemoryConversationStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConversationStore;

use relaybot_config::{AppConfig, MemoryConfig};
use relaybot_core::error::MemoryError;
use relaybot_core::memory::ConversationMemory;
use std::sync::Arc;
use tracing::info;

/// Build the memory backend named by `[memory] backend`.
pub async fn build_from_config(
    config: &MemoryConfig,
) -> Result<Arc<dyn ConversationMemory>, MemoryError> {
    let memory: Arc<dyn ConversationMemory> = match config.backend.as_str() {
        "none" => Arc::new(NoopMemory),
        "in_memory" => Arc::new(InMemoryConversationStore::new(config.capacity)),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = match &config.path {
                Some(p) if p.starts_with("sqlite:") => p.clone(),
                Some(p) => format!("sqlite:{p}"),
                None => {
                    let dir = AppConfig::config_dir();
                    std::fs::create_dir_all(&dir).map_err(|e| {
                        MemoryError::Storage(format!("create {}: {e}", dir.display()))
                    })?;
                    format!("sqlite:{}", dir.join("memory.db").display())
                }
            };
            Arc::new(SqliteConversationStore::new(&path, config.capacity).await?)
        }
        other => {
            return Err(MemoryError::Storage(format!(
                "unsupported memory backend '{other}'"
            )));
        }
    };

    info!(
        backend = memory.name(),
        capacity = memory.capacity(),
        "Conversation memory ready"
    );
    Ok(memory)
}
