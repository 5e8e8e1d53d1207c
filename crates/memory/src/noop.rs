//! No-op memory backend — every turn starts without context.

use async_trait::async_trait;
use relaybot_core::error::MemoryError;
use relaybot_core::memory::{ConversationMemory, Exchange};

/// A memory backend that remembers nothing.
pub struct NoopMemory;

#[async_trait]
impl ConversationMemory for NoopMemory {
    fn name(&self) -> &str {
        "none"
    }

    fn capacity(&self) -> usize {
        0
    }

    async fn record(&self, _user_id: &str, _exchange: Exchange) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn history(&self, _user_id: &str) -> Result<Vec<Exchange>, MemoryError> {
        Ok(Vec::new())
    }

    async fn forget(&self, _user_id: &str) -> Result<bool, MemoryError> {
        Ok(false)
    }
}
