//! Reply formatting — the second LLM call of a data question.

use async_trait::async_trait;
use crate::error::ProviderError;
use crate::query::Row;

/// Phrases query results as a plain-text answer in the target language.
#[async_trait]
pub trait ReplyFormatter: Send + Sync {
    async fn format(
        &self,
        utterance: &str,
        rows: &[Row],
        language: &str,
    ) -> Result<String, ProviderError>;
}
