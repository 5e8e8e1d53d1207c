//! LLM-backed intent classifier and SQL generator.

use crate::prompt::PromptSet;
use async_trait::async_trait;
use relaybot_core::intent::{Classification, Classifier, Intent};
use relaybot_core::provider::{Provider, ProviderRequest};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Classifies utterances with one LLM completion per turn.
pub struct LlmClassifier {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    prompts: Arc<PromptSet>,
    default_language: String,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, prompts: Arc<PromptSet>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            prompts,
            default_language: "pa-IN".into(),
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

    /// Language used when the model omits one.
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, utterance: &str, context: &str) -> Classification {
        let prompt = self.prompts.classification(utterance, context);
        debug!(prompt_len = prompt.len(), "Classifying utterance");

        let mut request = ProviderRequest::prompt(&self.model, prompt).with_temperature(self.temperature);
        request.max_tokens = self.max_tokens;

        match self.provider.complete(request).await {
            Ok(response) => {
                debug!(raw = %response.message.content, "Classifier response");
                parse_classification(&response.message.content, &self.default_language)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Classifier call failed");
                Classification::error(e)
            }
        }
    }
}

/// Remove a surrounding markdown code fence.
///
/// Strips a leading ```` ```json ````, then a leading ```` ``` ````, then a
/// trailing ```` ``` ````, trimming whitespace after each step.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest.trim();
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim();
    }
    text
}

#[derive(Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(default)]
    language: Option<String>,
    reply: String,
}

/// Parse the model's text into a [`Classification`].
///
/// Never fails: output that is not a JSON object with string `intent` and
/// `reply` fields becomes an `error` classification carrying the parse error.
pub fn parse_classification(text: &str, default_language: &str) -> Classification {
    match serde_json::from_str::<RawClassification>(strip_code_fences(text)) {
        Ok(raw) => {
            let language = raw
                .language
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| default_language.to_string());
            Classification::new(Intent::from_label(&raw.intent), language, raw.reply)
        }
        Err(e) => {
            warn!(error = %e, "Classifier output is not valid JSON");
            Classification::error(e)
        }
    }
}
