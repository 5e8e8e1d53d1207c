//! Shared test helpers: scripted providers and stub collaborators.

use async_trait::async_trait;
use relaybot_core::error::{MemoryError, ProviderError, QueryError};
use relaybot_core::intent::{Classification, Classifier};
use relaybot_core::memory::{ConversationMemory, Exchange};
use relaybot_core::message::Message;
use relaybot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use relaybot_core::query::{QueryExecutor, Row};
use relaybot_core::reply::ReplyFormatter;
use std::sync::Mutex;
use std::time::Duration;

/// A provider that returns a sequence of scripted results and records
/// every request it receives.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    results: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            panic!(
                "ScriptedProvider: no more responses (call #{})",
                requests.len() + 1
            );
        }
        requests.push(request);
        results.remove(0)
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Returns the same classification every time and records its inputs.
pub struct StubClassifier {
    result: Classification,
    seen: Mutex<Vec<(String, String)>>,
}

impl StubClassifier {
    pub fn new(result: Classification) -> Self {
        Self {
            result,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// `(utterance, context)` pairs in call order.
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, utterance: &str, context: &str) -> Classification {
        self.seen
            .lock()
            .unwrap()
            .push((utterance.to_string(), context.to_string()));
        self.result.clone()
    }
}

/// A classifier that never answers within any reasonable timeout.
pub struct HangingClassifier;

#[async_trait]
impl Classifier for HangingClassifier {
    async fn classify(&self, _utterance: &str, _context: &str) -> Classification {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Classification::error("unreachable")
    }
}

/// Fails the test if the pipeline reaches the executor.
pub struct PanickingExecutor;

#[async_trait]
impl QueryExecutor for PanickingExecutor {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        panic!("executor must not be called (got {sql:?})");
    }
}

/// Fails the test if the pipeline reaches the formatter.
pub struct PanickingFormatter;

#[async_trait]
impl ReplyFormatter for PanickingFormatter {
    async fn format(&self, _: &str, _: &[Row], _: &str) -> Result<String, ProviderError> {
        panic!("formatter must not be called");
    }
}

/// Returns fixed rows (or a fixed error) and records the SQL it ran.
pub struct StubExecutor {
    result: Result<Vec<Row>, QueryError>,
    delay: Option<Duration>,
    seen: Mutex<Vec<String>>,
}

impl StubExecutor {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            result: Ok(rows),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: QueryError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for StubExecutor {
    fn name(&self) -> &str {
        "stub"
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        self.seen.lock().unwrap().push(sql.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Echoes what it was given and records the inputs.
pub struct RecordingFormatter {
    reply: Result<String, ProviderError>,
    seen: Mutex<Vec<(String, Vec<Row>, String)>>,
}

impl RecordingFormatter {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// `(utterance, rows, language)` triples in call order.
    pub fn seen(&self) -> Vec<(String, Vec<Row>, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyFormatter for RecordingFormatter {
    async fn format(
        &self,
        utterance: &str,
        rows: &[Row],
        language: &str,
    ) -> Result<String, ProviderError> {
        self.seen
            .lock()
            .unwrap()
            .push((utterance.to_string(), rows.to_vec(), language.to_string()));
        self.reply.clone()
    }
}

/// A memory backend whose every operation fails.
pub struct BrokenMemory;

#[async_trait]
impl ConversationMemory for BrokenMemory {
    fn name(&self) -> &str {
        "broken"
    }

    fn capacity(&self) -> usize {
        5
    }

    async fn record(&self, _user_id: &str, _exchange: Exchange) -> Result<(), MemoryError> {
        Err(MemoryError::Storage("disk full".into()))
    }

    async fn history(&self, _user_id: &str) -> Result<Vec<Exchange>, MemoryError> {
        Err(MemoryError::Storage("disk full".into()))
    }

    async fn forget(&self, _user_id: &str) -> Result<bool, MemoryError> {
        Err(MemoryError::Storage("disk full".into()))
    }
}
