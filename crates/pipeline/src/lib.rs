//! The RelayBot message pipeline.
//!
//! Every channel funnels into one [`MessagePipeline`]: fetch the user's
//! recent history, classify the utterance with an LLM, answer data
//! questions by running the generated SQL and narrating the rows, then
//! remember the exchange.

pub mod classifier;
pub mod formatter;
pub mod pipeline;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use classifier::{LlmClassifier, parse_classification, strip_code_fences};
pub use formatter::LlmFormatter;
pub use pipeline::{FailurePolicy, MessagePipeline, Turn};
pub use prompt::PromptSet;

use relaybot_config::AppConfig;
use relaybot_core::error::{Error, ProviderError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Assemble the pipeline described by `config`.
///
/// The classifier and formatter share the default provider. The database
/// pool connects lazily, so an unreachable database does not prevent startup.
pub async fn build_from_config(config: &AppConfig) -> Result<MessagePipeline, Error> {
    let router = relaybot_providers::build_from_config(config)?;
    let provider = router.default().ok_or_else(|| {
        ProviderError::NotConfigured(format!(
            "default provider '{}' is not registered",
            config.default_provider
        ))
    })?;

    let model = config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());

    let prompts = PromptSet::load(config.pipeline.schema_path.as_deref().map(Path::new))
        .map_err(|e| Error::Config {
            message: format!("cannot read pipeline.schema_path: {e}"),
        })?;
    let prompts = Arc::new(prompts);

    let classifier = LlmClassifier::new(provider.clone(), model.clone(), prompts.clone())
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_default_language(&config.pipeline.default_language);
    let formatter = LlmFormatter::new(provider.clone(), model.clone(), prompts)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens);

    let memory = relaybot_memory::build_from_config(&config.memory).await?;
    let executor = relaybot_query::connect(&config.database)?;

    info!(
        provider = provider.name(),
        model = %model,
        executor = executor.name(),
        on_failure = %config.pipeline.on_failure,
        "Message pipeline ready"
    );

    Ok(
        MessagePipeline::new(memory, Arc::new(classifier), executor, Arc::new(formatter))
            .with_stage_timeout(Duration::from_secs(config.pipeline.stage_timeout_secs))
            .with_failure_policy(FailurePolicy::from_config(&config.pipeline)),
    )
}
