use async_trait::async_trait;
use relaybot_core::error::{ProviderError, QueryError};
use relaybot_core::intent::{Classification, Classifier, Intent};
use relaybot_core::query::{QueryExecutor, Row};
use relaybot_core::reply::ReplyFormatter;
use relaybot_memory::InMemoryConversationStore;
use relaybot_pipeline::MessagePipeline;
use std::sync::Arc;

/// Answers every utterance with `echo: <utterance>`.
pub struct EchoClassifier;

#[async_trait]
impl Classifier for EchoClassifier {
    async fn classify(&self, utterance: &str, _context: &str) -> Classification {
        Classification::new(Intent::Other, "en-IN", format!("echo: {utterance}"))
    }
}

struct NoExecutor;

#[async_trait]
impl QueryExecutor for NoExecutor {
    fn name(&self) -> &str {
        "none"
    }

    async fn execute(&self, _sql: &str) -> Result<Vec<Row>, QueryError> {
        panic!("executor must not be called");
    }
}

struct NoFormatter;

#[async_trait]
impl ReplyFormatter for NoFormatter {
    async fn format(&self, _: &str, _: &[Row], _: &str) -> Result<String, ProviderError> {
        panic!("formatter must not be called");
    }
}

/// A pipeline that echoes, plus its memory for inspection.
pub fn echo_pipeline() -> (MessagePipeline, Arc<InMemoryConversationStore>) {
    let memory = Arc::new(InMemoryConversationStore::default());
    let pipeline = MessagePipeline::new(
        memory.clone(),
        Arc::new(EchoClassifier),
        Arc::new(NoExecutor),
        Arc::new(NoFormatter),
    );
    (pipeline, memory)
}
