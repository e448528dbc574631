use clap::{Args, Subcommand};
use tracing::info;

use crate::cli::management::config::redact_url;
use crate::error::Result;
use crate::services::ResolverContext;

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommands,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Probe the cache store and show statistics
    Stats,

    /// Clear all memoized provider responses
    Clear,

    /// Show cache configuration
    Info,
}

pub async fn execute(args: CacheArgs, ctx: &ResolverContext) -> Result<()> {
    match args.command {
        CacheCommands::Stats => {
            if !ctx.cache_enabled() {
                println!("ℹ️  Caching is disabled; provider calls are not memoized");
                return Ok(());
            }

            let probe = ctx.probe_cache().await;
            let stats = ctx.cache_stats();

            println!("📊 Cache Statistics");
            println!("══════════════════");
            println!("🗄️  Backend: {}", stats.backend);
            match probe {
                Ok(latency) => println!("✅ Reachable: yes ({} ms round trip)", latency.as_millis()),
                Err(e) => println!("❌ Reachable: no ({})", e),
            }
            println!("📈 Lookups this process: {}", stats.hits + stats.misses);
            println!("✅ Cache Hits: {}", stats.hits);
            println!("💾 Writes: {}", stats.writes);
            println!("⚠️  Store Errors: {}", stats.store_errors);
            println!("📊 Hit Rate: {:.1}%", stats.hit_rate_percent);
        }

        CacheCommands::Clear => {
            if !ctx.cache_enabled() {
                println!("ℹ️  No cache store configured, nothing to clear");
                return Ok(());
            }

            info!("🗑️ Clearing cache...");
            let removed = ctx.clear_cache().await?;

            println!("✅ Cache cleared successfully!");
            println!("🗑️ Removed {} entries under '{}:*'", removed, ctx.config().cache_key_prefix);
        }

        CacheCommands::Info => {
            let config = ctx.config();

            println!("ℹ️  Cache Configuration");
            println!("═════════════════════");
            println!("🗄️  Backend: {:?} (active: {})", config.cache_backend, ctx.cache_stats().backend);
            println!(
                "🔗 Redis URL: {}",
                config.redis_url.as_deref().map(redact_url).unwrap_or_else(|| "none".to_string())
            );
            println!("🔑 Key Prefix: {}:", config.cache_key_prefix);
            println!("⌛ Search TTL: {}s", config.search_ttl_seconds);
            println!("⌛ Download TTL: {}s", config.download_ttl_seconds);
            println!("⌛ Default TTL: {}s", config.default_ttl_seconds);
            println!("⏱️  Store Timeout: {}s", config.cache_connect_timeout_seconds);

            println!("\n💡 Tips:");
            println!("  • Only successful provider answers are cached");
            println!("  • An unreachable store never fails a lookup, it is skipped");
            println!("  • Use 'lrcresolve cache stats' to check the store is reachable");
        }
    }

    Ok(())
}
