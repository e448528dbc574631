use clap::{Parser, Subcommand};
use std::process::ExitCode;

use lrcresolve::cli::core::resolve;
use lrcresolve::cli::management::{cache, config as config_cmd};
use lrcresolve::cli::operations::batch;
use lrcresolve::config::Config;
use lrcresolve::error::Result;
use lrcresolve::services::ResolverContext;
use lrcresolve::utils;

#[derive(Parser)]
#[command(name = "lrcresolve")]
#[command(about = "Resolve time-synced lyrics for a song from the Kugou lyrics service")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve lyrics for one song
    Resolve(resolve::ResolveArgs),

    /// Resolve lyrics for every song in a JSON or CSV file
    Batch(batch::BatchArgs),

    /// Manage the memoization cache
    Cache(cache::CacheArgs),

    /// Show configuration
    Config(config_cmd::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = utils::logging::init_logging(cli.verbose) {
        eprintln!("⚠️  {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve(args) => resolve::execute(args, &ResolverContext::new(config)?).await,
        Commands::Batch(args) => batch::execute(args, &ResolverContext::new(config)?).await,
        Commands::Cache(args) => cache::execute(args, &ResolverContext::new(config)?).await,
        Commands::Config(args) => config_cmd::execute(args, &config).await,
    }
}
