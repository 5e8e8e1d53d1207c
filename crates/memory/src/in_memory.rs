//! In-memory backend — the default, process-lifetime conversation store.

use async_trait::async_trait;
use relaybot_core::error::MemoryError;
use relaybot_core::memory::{ConversationMemory, DEFAULT_HISTORY_CAPACITY, Exchange};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Bounded per-user histories held in a map behind an async lock.
///
/// Histories are created lazily on the first `record` and evict their
/// oldest exchange once `capacity` is reached.
pub struct InMemoryConversationStore {
    histories: Arc<RwLock<HashMap<String, VecDeque<Exchange>>>>,
    capacity: usize,
}

impl InMemoryConversationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            histories: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Number of users with a non-empty history.
    pub async fn user_count(&self) -> usize {
        self.histories.read().await.len()
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn record(&self, user_id: &str, exchange: Exchange) -> Result<(), MemoryError> {
        let mut histories = self.histories.write().await;
        let history = histories
            .entry(user_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(exchange);
        Ok(())
    }

    async fn history(&self, user_id: &str) -> Result<Vec<Exchange>, MemoryError> {
        let histories = self.histories.read().await;
        Ok(histories
            .get(user_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn forget(&self, user_id: &str) -> Result<bool, MemoryError> {
        Ok(self.histories.write().await.remove(user_id).is_some())
    }
}
