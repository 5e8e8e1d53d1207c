//! `relaybot status` — Show effective configuration.

use relaybot_config::redact_url;
use relaybot_core::channel::ChannelKind;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let path = super::config_path(config_path);

    println!("🚌 RelayBot Status");
    println!("==================");
    println!("  Config file:  {}", path.display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Temperature:  {}", config.default_temperature);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!(
        "  Memory:       {} (capacity {})",
        config.memory.backend, config.memory.capacity
    );
    println!(
        "  Database:     {}{}",
        config
            .database
            .connection_url()
            .map(|u| redact_url(&u))
            .unwrap_or_else(|| "not configured".into()),
        if config.database.read_only { " (read-only)" } else { "" }
    );
    println!("  Language:     {}", config.pipeline.default_language);
    println!("  On failure:   {}", config.pipeline.on_failure);
    println!("  Speech key:   {}", if config.speech.api_key.is_some() { "set" } else { "missing" });
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  History API:  {}", if config.gateway.admin_token.is_some() { "enabled" } else { "disabled" });

    println!("\n  Channels:");
    for kind in ChannelKind::ALL {
        let channel = config.channel(kind.as_str());
        let state = if channel.enabled { "enabled" } else { "disabled" };
        let signed = if channel.auth_token.is_some() { ", signed" } else { "" };
        println!(
            "    {:<9} {state}{signed}, allow: {}",
            kind.as_str(),
            channel.allowed_users.join(", ")
        );
    }

    if path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `relaybot onboard` first");
    }
    Ok(())
}
