//! RapidComm uploader entry point.
//!
//! Usage: `rapidcomm-uploader <file>...`

mod app;
mod config;
mod notifier;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting RapidComm uploader");

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        anyhow::bail!("usage: rapidcomm-uploader <file>...");
    }

    let config = config::load()?;
    tracing::info!(endpoint = %config.endpoint, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let failed = rt.block_on(app::run(config, files))?;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
