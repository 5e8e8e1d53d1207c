//! The message pipeline: one linear turn per inbound message.
//!
//! 1. **Context**: fetch the user's rendered history
//! 2. **Classify**: utterance + context → [`Classification`]
//! 3. **Branch**: a `Query` runs its SQL and narrates the rows; any other
//!    intent answers with the classifier's reply verbatim
//! 4. **Commit**: record the exchange and return the reply
//!
//! No retries, no loops. Every external stage is bounded by a timeout.

use relaybot_config::PipelineConfig;
use relaybot_core::channel::{ChannelKind, InboundMessage};
use relaybot_core::error::{Error, ProviderError, QueryError};
use relaybot_core::intent::{Classification, Classifier, Intent};
use relaybot_core::memory::{ConversationMemory, Exchange};
use relaybot_core::query::QueryExecutor;
use relaybot_core::reply::ReplyFormatter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// What happens when the executor or the formatter fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Finish the turn with this text; it is remembered like any reply.
    Apology(String),
    /// Fail the turn and remember nothing.
    Propagate,
}

impl FailurePolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        match config.on_failure.as_str() {
            "propagate" => FailurePolicy::Propagate,
            _ => FailurePolicy::Apology(config.apology_message.clone()),
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::from_config(&PipelineConfig::default())
    }
}

/// The outcome of one completed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub reply: String,
    pub intent: Intent,
    pub language: String,
}

/// Orchestrates memory, classifier, executor and formatter for each turn.
pub struct MessagePipeline {
    memory: Arc<dyn ConversationMemory>,
    classifier: Arc<dyn Classifier>,
    executor: Arc<dyn QueryExecutor>,
    formatter: Arc<dyn ReplyFormatter>,
    stage_timeout: Duration,
    on_failure: FailurePolicy,
}

impl MessagePipeline {
    pub fn new(
        memory: Arc<dyn ConversationMemory>,
        classifier: Arc<dyn Classifier>,
        executor: Arc<dyn QueryExecutor>,
        formatter: Arc<dyn ReplyFormatter>,
    ) -> Self {
        Self {
            memory,
            classifier,
            executor,
            formatter,
            stage_timeout: Duration::from_secs(30),
            on_failure: FailurePolicy::default(),
        }
    }

    /// Bound each classifier, executor and formatter call.
    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = stage_timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn memory(&self) -> &Arc<dyn ConversationMemory> {
        &self.memory
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    /// Run one turn and return its final reply text.
    pub async fn handle(
        &self,
        user_id: &str,
        message: &str,
        channel: ChannelKind,
    ) -> Result<String, Error> {
        let turn = self
            .process(&InboundMessage::new(user_id, message, channel))
            .await?;
        Ok(turn.reply)
    }

    /// Run one turn.
    ///
    /// Exactly one exchange is recorded when this returns `Ok`; nothing is
    /// recorded when it returns `Err`.
    pub async fn process(&self, inbound: &InboundMessage) -> Result<Turn, Error> {
        let user_id = inbound.user_id.as_str();
        let utterance = inbound.message.as_str();

        let context = match self.memory.context_for(user_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(user_id, error = %e, "Memory read failed, continuing without context");
                String::new()
            }
        };

        let classification = self.classify(utterance, &context).await;
        info!(
            user_id,
            channel = %inbound.channel,
            intent = %classification.intent,
            language = %classification.language,
            "Message classified"
        );

        let reply = if classification.is_query() {
            match self.answer_query(utterance, &classification).await {
                Ok(reply) => reply,
                Err(e) => match &self.on_failure {
                    FailurePolicy::Apology(text) => {
                        warn!(user_id, error = %e, "Data question failed, sending apology");
                        text.clone()
                    }
                    FailurePolicy::Propagate => {
                        error!(user_id, error = %e, "Data question failed");
                        return Err(e);
                    }
                },
            }
        } else {
            classification.reply.clone()
        };

        if let Err(e) = self
            .memory
            .record(user_id, Exchange::new(utterance, reply.as_str()))
            .await
        {
            warn!(user_id, error = %e, "Failed to record exchange");
        }

        Ok(Turn {
            reply,
            intent: classification.intent,
            language: classification.language,
        })
    }

    async fn classify(&self, utterance: &str, context: &str) -> Classification {
        match timeout(self.stage_timeout, self.classifier.classify(utterance, context)).await {
            Ok(classification) => classification,
            Err(_) => {
                warn!(timeout_secs = self.stage_timeout.as_secs(), "Classifier timed out");
                Classification::error(format!(
                    "classifier timed out after {}s",
                    self.stage_timeout.as_secs()
                ))
            }
        }
    }

    async fn answer_query(
        &self,
        utterance: &str,
        classification: &Classification,
    ) -> Result<String, Error> {
        let sql = classification.reply.as_str();
        debug!(sql, executor = self.executor.name(), "Executing query");

        let rows = timeout(self.stage_timeout, self.executor.execute(sql))
            .await
            .map_err(|_| QueryError::Timeout(self.stage_timeout.as_secs()))??;
        debug!(rows = rows.len(), "Query returned");

        let reply = timeout(
            self.stage_timeout,
            self.formatter
                .format(utterance, &rows, &classification.language),
        )
        .await
        .map_err(|_| {
            ProviderError::Timeout(format!(
                "formatter timed out after {}s",
                self.stage_timeout.as_secs()
            ))
        })??;

        Ok(reply)
    }
}
