//! `relaybot ask` — Run a single message through the pipeline.

use relaybot_core::channel::{ChannelKind, InboundMessage};
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    user: &str,
    channel: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let channel: ChannelKind = channel.parse()?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    RELAYBOT_API_KEY=...   (generic)");
        eprintln!("    GEMINI_API=...         (Google Gemini)");
        eprintln!();
        eprintln!("  Or add api_key to {}", super::config_path(config_path).display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let pipeline = relaybot_pipeline::build_from_config(&config).await?;
    let turn = pipeline
        .process(&InboundMessage::new(user, message, channel))
        .await?;

    tracing::debug!(intent = %turn.intent, language = %turn.language, "Turn complete");
    println!("{}", turn.reply);

    Ok(())
}
