use clap::Args;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::cli::core::LyricsResponse;
use crate::core::resolver::UNCONSTRAINED_DURATION;
use crate::core::Query;
use crate::error::{ResolverError, Result};
use crate::services::ResolverContext;

#[derive(Args)]
pub struct BatchArgs {
    /// Batch file path (JSON or CSV)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Maximum parallel resolutions
    #[arg(long, default_value = "4")]
    parallel: usize,

    /// Output report to file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BatchItem {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    /// Seconds, as a number or a string; anything else matches any length
    #[serde(default)]
    pub duration: Option<Value>,
}

impl BatchItem {
    fn duration_seconds(&self) -> i64 {
        match &self.duration {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(UNCONSTRAINED_DURATION),
            Some(Value::String(s)) => Query::parse_duration(Some(s.as_str())),
            _ => UNCONSTRAINED_DURATION,
        }
    }
}

#[derive(Serialize)]
pub struct BatchResult {
    pub item: BatchItem,
    pub response: LyricsResponse,
    pub execution_time_ms: u64,
}

#[derive(Serialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub total_items: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
    pub execution_time_ms: u64,
    pub results: Vec<BatchResult>,
}

impl BatchReport {
    fn new(results: Vec<BatchResult>, execution_time_ms: u64) -> Self {
        let count = |code: u16| results.iter().filter(|r| r.response.code == code).count();
        let found = count(200);
        let not_found = count(404);
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_items: results.len(),
            found,
            not_found,
            failed: results.len() - found - not_found,
            execution_time_ms,
            results,
        }
    }
}

pub async fn execute(args: BatchArgs, ctx: &ResolverContext) -> Result<()> {
    info!("📋 Processing batch file: {}", args.file.display());

    if !args.file.exists() {
        return Err(ResolverError::Validation(format!(
            "Batch file does not exist: {}",
            args.file.display()
        )));
    }
    if args.parallel == 0 {
        return Err(ResolverError::Validation(
            "--parallel must be at least 1".to_string(),
        ));
    }

    let items = load_batch_file(&args.file)?;
    info!("📥 Loaded {} items from batch file", items.len());

    let report = run_batch(ctx, items, args.parallel).await?;

    if let Some(output_path) = &args.output {
        let json_report = serde_json::to_string_pretty(&report)?;
        fs::write(output_path, json_report)?;
        info!("📋 Batch report saved to {}", output_path.display());
    }

    println!("\n📊 Batch Summary:");
    println!("  ✅ Found: {}", report.found);
    println!("  🔎 Not found: {}", report.not_found);
    println!("  ❌ Failed: {}", report.failed);
    println!("  ⏱️ Total Time: {:.2}s", report.execution_time_ms as f64 / 1000.0);
    if report.total_items > 0 {
        println!(
            "  📈 Hit Rate: {:.1}%",
            (report.found as f64 / report.total_items as f64) * 100.0
        );
    }

    Ok(())
}

/// Resolve every item over the shared context, at most `parallel` at a time.
/// Results keep the input order.
pub async fn run_batch(
    ctx: &ResolverContext,
    items: Vec<BatchItem>,
    parallel: usize,
) -> Result<BatchReport> {
    let start_time = std::time::Instant::now();
    let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
    let mut tasks = Vec::with_capacity(items.len());

    for item in items {
        let ctx = ctx.clone();
        let semaphore = semaphore.clone();

        tasks.push(tokio::spawn(async move {
            let item_start = std::time::Instant::now();

            let response = match semaphore.acquire().await {
                Ok(_permit) => {
                    let outcome = ctx
                        .resolve_lyrics(&item.title, item.artist.as_deref(), Some(item.duration_seconds()))
                        .await;
                    if let Err(ref e) = outcome {
                        warn!("❌ Failed to resolve {}: {}", item.title, e);
                    }
                    LyricsResponse::from_outcome(&outcome)
                }
                Err(_) => LyricsResponse {
                    code: 500,
                    lyrics: None,
                    message: Some("Semaphore closed while acquiring permit".to_string()),
                },
            };

            BatchResult {
                item,
                response,
                execution_time_ms: item_start.elapsed().as_millis() as u64,
            }
        }));
    }

    let results = join_all(tasks)
        .await
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(BatchReport::new(results, start_time.elapsed().as_millis() as u64))
}

fn load_batch_file(file_path: &Path) -> Result<Vec<BatchItem>> {
    let content = fs::read_to_string(file_path)?;
    let extension = file_path.extension().and_then(|s| s.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "json" => Ok(serde_json::from_str(&content)?),
        "csv" => Ok(parse_csv(&content)),
        _ => Err(ResolverError::Validation(
            "Unsupported batch file format. Use .json or .csv".to_string(),
        )),
    }
}

/// `title[,artist[,duration]]` per line, optional header
fn parse_csv(content: &str) -> Vec<BatchItem> {
    let mut lines = content.lines().peekable();

    if let Some(first) = lines.peek() {
        let lower = first.to_lowercase();
        if lower.contains("title") && (lower.contains("artist") || lower.contains("duration")) {
            lines.next();
        }
    }

    lines.filter_map(parse_csv_line).collect()
}

fn parse_csv_line(line: &str) -> Option<BatchItem> {
    if line.trim().is_empty() {
        return None;
    }

    let fields: Vec<&str> = line.split(',').map(|f| f.trim().trim_matches('"')).collect();
    let title = fields[0];
    if title.is_empty() {
        warn!("Skipping CSV line without a title: {}", line);
        return None;
    }

    Some(BatchItem {
        id: None,
        title: title.to_string(),
        artist: fields.get(1).filter(|s| !s.is_empty()).map(|s| s.to_string()),
        duration: fields
            .get(2)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string())),
    })
}
