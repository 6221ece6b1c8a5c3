//! File cache pool admin - inspect and maintain a cache pool on disk
//!
//! The pool location comes from the environment (`CACHE_ROOT`,
//! `CACHE_FOLDER`, `CACHE_DEFAULT_TTL_SECS`). Results are printed as JSON on
//! stdout; logs go to stderr.

mod commands;
mod error;

use crate::commands::{run, Command};
use crate::error::{AdminError, Result};
use clap::Parser;
use file_cache_pool::PoolConfig;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "file-cache-pool-admin", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("file_cache_pool_admin=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let cli = Cli::parse();

    // Load configuration from environment
    let config = PoolConfig::from_env();
    info!("Cache root: {:?}", config.root_dir);
    info!("Cache folder: {}", config.folder);
    if let Some(ttl) = config.default_ttl_secs {
        info!("Default TTL: {} seconds", ttl);
    }

    let pool = config
        .build()
        .map_err(|e| AdminError::Config(format!("Invalid pool configuration: {}", e)))?;
    pool.init().await?;

    let output = run(&pool, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
