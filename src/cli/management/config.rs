use clap::{Args, Subcommand};

use crate::config::env::EnvParser;
use crate::config::Config as AppConfig;
use crate::error::Result;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

pub async fn execute(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            println!("🔧 Current configuration:");
            println!("  🔗 redis_url: {}", config.redis_url.as_deref().map(redact_url).unwrap_or_else(|| "none".to_string()));
            println!("  🗄️  cache_backend: {:?}", config.cache_backend);
            println!("  🔑 cache_key_prefix: {}", config.cache_key_prefix);
            println!("  🎵 song_search_url: {}", config.song_search_url);
            println!("  📝 lyrics_search_url: {}", config.lyrics_search_url);
            println!("  ⬇️  lyrics_download_url: {}", config.lyrics_download_url);
            println!("  ⏱️  request_timeout_seconds: {}", config.request_timeout_seconds);
            println!("  ⏱️  cache_connect_timeout_seconds: {}", config.cache_connect_timeout_seconds);
            println!("  ⌛ search_ttl_seconds: {}", config.search_ttl_seconds);
            println!("  ⌛ download_ttl_seconds: {}", config.download_ttl_seconds);
            println!("  ⌛ default_ttl_seconds: {}", config.default_ttl_seconds);

            let env_vars = EnvParser::get_all_lrcresolve_vars();
            if !env_vars.is_empty() {
                println!("\n🌍 Environment overrides:");
                for (key, value) in env_vars {
                    let value = if key.contains("REDIS_URL") { redact_url(&value) } else { value };
                    println!("  {} = {}", key, value);
                }
            }
        }

        ConfigCommands::Path => {
            let config_path = AppConfig::config_path()?;
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Hide the password part of a connection URL
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("****")).is_err() {
                return "<redacted>".to_string();
            }
            parsed.to_string()
        }
        Ok(_) => raw.to_string(),
        Err(_) => "<invalid url>".to_string(),
    }
}
