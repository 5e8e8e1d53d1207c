//! LLM-backed reply formatter: turns query rows into a spoken-style answer.

use crate::prompt::PromptSet;
use async_trait::async_trait;
use relaybot_core::error::ProviderError;
use relaybot_core::provider::{Provider, ProviderRequest};
use relaybot_core::query::Row;
use relaybot_core::reply::ReplyFormatter;
use std::sync::Arc;
use tracing::debug;

pub struct LlmFormatter {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    prompts: Arc<PromptSet>,
}

impl LlmFormatter {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, prompts: Arc<PromptSet>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            prompts,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl ReplyFormatter for LlmFormatter {
    async fn format(
        &self,
        utterance: &str,
        rows: &[Row],
        language: &str,
    ) -> Result<String, ProviderError> {
        let prompt = self.prompts.narration(utterance, rows, language);
        debug!(rows = rows.len(), language, "Formatting reply");

        let mut request = ProviderRequest::prompt(&self.model, prompt).with_temperature(self.temperature);
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        let reply = plain_text(&response.message.content);
        if reply.is_empty() {
            return Err(ProviderError::EmptyResponse(
                "formatter produced no text".into(),
            ));
        }
        Ok(reply)
    }
}

/// Strip markdown emphasis, code ticks and heading markers so the reply
/// reads cleanly over SMS and through text-to-speech.
pub fn plain_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.trim_start()
                .trim_start_matches('#')
                .replace(['*', '`'], "")
                .trim()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;
    use serde_json::json;

    #[test]
    fn markdown_is_removed() {
        assert_eq!(
            plain_text("## Next bus\n**Bus 21** arrives in `8` minutes.\n"),
            "Next bus\nBus 21 arrives in 8 minutes."
        );
        assert_eq!(plain_text("  plain reply  "), "plain reply");
    }

    #[tokio::test]
    async fn rows_and_language_reach_the_prompt() {
        let provider = Arc::new(ScriptedProvider::texts(&["Bus 21 aa rahi hai, 8 minute vich."]));
        let formatter = LlmFormatter::new(provider.clone(), "m", Arc::new(PromptSet::default()));

        let mut row = Row::new();
        row.insert("bus_number".into(), json!("21"));
        let reply = formatter.format("next bus?", &[row], "pa-IN").await.unwrap();

        assert_eq!(reply, "Bus 21 aa rahi hai, 8 minute vich.");
        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains(r#""bus_number":"21""#));
        assert!(prompt.contains("Language: pa-IN"));
    }

    #[tokio::test]
    async fn blank_output_is_an_error() {
        let provider = Arc::new(ScriptedProvider::texts(&["**"]));
        let formatter = LlmFormatter::new(provider, "m", Arc::new(PromptSet::default()));
        assert!(matches!(
            formatter.format("q", &[], "en-IN").await,
            Err(ProviderError::EmptyResponse(_))
        ));
    }
}
