//! `relaybot doctor` — Diagnose configuration and connectivity.

use relaybot_config::redact_url;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 RelayBot Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let path = super::config_path(config_path);
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file — run `relaybot onboard` (using defaults)");
        issues += 1;
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set RELAYBOT_API_KEY or GEMINI_API");
        issues += 1;
    }

    if config.speech.api_key.is_some() {
        println!("  ✅ Speech API key configured");
    } else {
        println!("  ⚠️  No speech API key — /call will fail (set AUDIO_API)");
        issues += 1;
    }

    // Database
    match config.database.connection_url() {
        None => {
            println!("  ⚠️  No database configured — data questions will get the apology reply");
            issues += 1;
        }
        Some(url) => match relaybot_query::connect(&config.database) {
            Ok(executor) => match executor.health_check().await {
                Ok(true) => println!("  ✅ Database reachable: {}", redact_url(&url)),
                Ok(false) => {
                    println!("  ❌ Database not ready: {}", redact_url(&url));
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Database unreachable: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Database misconfigured: {e}");
                issues += 1;
            }
        },
    }

    // Provider
    match relaybot_providers::build_from_config(&config) {
        Ok(router) => match router.default() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  ❌ Provider '{}' rejected the health check", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ Default provider '{}' not registered", config.default_provider);
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Provider misconfigured: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
