//! `relaybot onboard` — First-time setup.

use relaybot_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_path(config_path);

    println!("🚌 RelayBot — First-Time Setup");
    println!("==============================\n");

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        } else {
            println!("  Config directory exists: {}", dir.display());
        }
    }

    if path.exists() {
        println!("\n⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", path.display());
    println!("\n📝 Next steps:");
    println!("   1. Add your Gemini key (api_key, or GEMINI_API in the environment)");
    println!("   2. Point [database] url at the transport database (or set DATABASE_URL)");
    println!("   3. Run: relaybot doctor");
    println!("   4. Run: relaybot serve\n");

    Ok(())
}
