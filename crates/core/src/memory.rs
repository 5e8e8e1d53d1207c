//! Conversation memory — a short rolling history per user.
//!
//! Each completed turn appends one [`Exchange`]. A history holds at most
//! `capacity` exchanges; the oldest is evicted first. The rendered history is
//! opaque context for the classifier and is never parsed back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// Number of exchanges remembered per user unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// One recorded (user utterance, bot reply) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// What the user said
    pub user: String,

    /// What the bot finally answered
    pub bot: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }
}

/// Render a history oldest-first as alternating `User:` / `Bot:` lines.
///
/// Returns an empty string for an empty history.
pub fn render_context(history: &[Exchange]) -> String {
    history
        .iter()
        .map(|e| format!("User: {}\nBot: {}", e.user, e.bot))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The core ConversationMemory trait.
///
/// Implementations: in-memory (default), SQLite (persistent), none (no-op).
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// The backend name (e.g., "in_memory", "sqlite", "none").
    fn name(&self) -> &str;

    /// Maximum number of exchanges kept per user.
    fn capacity(&self) -> usize;

    /// Append an exchange, evicting the oldest one if the history is full.
    async fn record(&self, user_id: &str, exchange: Exchange) -> Result<(), MemoryError>;

    /// The user's history, oldest first. Empty for unknown users.
    async fn history(&self, user_id: &str) -> Result<Vec<Exchange>, MemoryError>;

    /// Drop a user's history. Returns whether anything was removed.
    async fn forget(&self, user_id: &str) -> Result<bool, MemoryError>;

    /// The user's history rendered as classifier context.
    async fn context_for(&self, user_id: &str) -> Result<String, MemoryError> {
        let history = self.history(user_id).await?;
        Ok(render_context(&history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_history() {
        assert_eq!(render_context(&[]), "");
    }

    #[test]
    fn render_alternates_user_and_bot() {
        let history = vec![
            Exchange::new("hi", "Hello! How can I help?"),
            Exchange::new("bus to Ludhiana", "Which stop are you at?"),
        ];
        assert_eq!(
            render_context(&history),
            "User: hi\nBot: Hello! How can I help?\nUser: bus to Ludhiana\nBot: Which stop are you at?"
        );
    }

    #[test]
    fn exchange_serializes_with_short_keys() {
        let json = serde_json::to_value(Exchange::new("a", "b")).unwrap();
        assert_eq!(json, serde_json::json!({"user": "a", "bot": "b"}));
    }
}
