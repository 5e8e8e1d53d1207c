//! Intent classification — the first LLM call of every turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Language tag used for replies produced locally (parse failures, etc.).
pub const FALLBACK_LANGUAGE: &str = "en-IN";

/// What the user wants, as judged by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// A data question; the classification reply is a SQL query.
    #[serde(rename = "Query")]
    Query,
    /// A data question missing details; the reply asks for clarification.
    #[serde(rename = "unQuery")]
    UnQuery,
    /// Small talk or anything else; the reply is a direct answer.
    #[serde(rename = "other")]
    Other,
    /// The classifier could not produce a usable result.
    #[serde(rename = "error")]
    Error,
}

impl Intent {
    /// Map a classifier label to an intent.
    ///
    /// Only `Query`, `unQuery` and `error` are distinguished; every other
    /// label (`other`, `others`, anything unexpected) is [`Intent::Other`].
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Query" => Intent::Query,
            "unQuery" => Intent::UnQuery,
            "error" => Intent::Error,
            _ => Intent::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Query => "Query",
            Intent::UnQuery => "unQuery",
            Intent::Other => "other",
            Intent::Error => "error",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classifier's structured decision for one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,

    /// Locale tag for the final reply (e.g. "pa-IN", "en-IN")
    pub language: String,

    /// SQL when `intent` is `Query`, display text otherwise
    pub reply: String,
}

impl Classification {
    pub fn new(intent: Intent, language: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            intent,
            language: language.into(),
            reply: reply.into(),
        }
    }

    /// The deterministic result used when classification fails.
    pub fn error(reason: impl std::fmt::Display) -> Self {
        Self::new(Intent::Error, FALLBACK_LANGUAGE, format!("Error: {reason}"))
    }

    pub fn is_query(&self) -> bool {
        self.intent == Intent::Query
    }
}

/// Turns an utterance plus memory context into a [`Classification`].
///
/// Infallible by contract: implementations convert every failure into
/// [`Classification::error`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, utterance: &str, context: &str) -> Classification;
}
