//! RelayBot CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP gateway (web, SMS, WhatsApp, call)
//! - `ask`      — Run one message through the pipeline
//! - `status`   — Show effective configuration
//! - `doctor`   — Diagnose configuration and connectivity
//! - `onboard`  — Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "relaybot",
    about = "RelayBot — multi-channel transport assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.relaybot/config.toml)
    #[arg(short, long, global = true, env = "RELAYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one message through the pipeline and print the reply
    Ask {
        /// User id the conversation history is kept under
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Channel to attribute the message to
        #[arg(long, default_value = "web")]
        channel: String,

        /// The message text
        message: String,
    },

    /// Show effective configuration (secrets redacted)
    Status,

    /// Diagnose configuration, database, and provider health
    Doctor,

    /// Write a default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask {
            user,
            channel,
            message,
        } => commands::ask::run(config_path, &user, &channel, &message).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
    }

    Ok(())
}
