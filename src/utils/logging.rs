use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so `resolve` output on stdout stays machine-readable
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        // Filter out noisy dependencies (these parse strings are static and known-valid)
        .add_directive("reqwest=warn".parse().expect("valid directive for reqwest"))
        .add_directive("hyper=warn".parse().expect("valid directive for hyper"))
        .add_directive("redis=warn".parse().expect("valid directive for redis"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;

    Ok(())
}
