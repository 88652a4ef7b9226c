//! favcache operator CLI.
//!
//! Runs the resolution chain once, shows where a host's cache entry lives,
//! and drops entries to force a fresh lookup. Configuration is the same
//! layered `AppConfig` the edge service reads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use favcache_client::{Resolver, normalize};
use favcache_core::{AppConfig, CacheStore, IconFormat};

#[derive(Parser)]
#[command(name = "favcache", about = "Resolve favicons and manage the favcache icon cache", version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the resolution chain for a URL, bypassing the cache.
    Resolve {
        /// Page URL or bare domain.
        url: String,

        /// Write the icon bytes to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the cache file path for a host.
    Key {
        /// Host, host:port, or any URL on the host.
        host: String,
    },

    /// Delete the cached entry for a host.
    Purge {
        /// Host, host:port, or any URL on the host.
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = AppConfig::load()?;

    let report = match cli.command {
        Commands::Resolve { url, output } => resolve(&config, &url, output.as_deref()).await?,
        Commands::Key { host } => key(&config, &host)?,
        Commands::Purge { host } => purge(&config, &host)?,
    };
    println!("{report}");

    Ok(())
}

async fn resolve(config: &AppConfig, url: &str, output: Option<&Path>) -> Result<String> {
    let resolver = Resolver::from_config(config)?;
    let icon = resolver.resolve(url).await?;
    let mime = IconFormat::sniff(&icon.bytes).map_or("unknown", IconFormat::mime);

    if let Some(path) = output {
        std::fs::write(path, &icon.bytes).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(format!("{}\t{}\t{}\t{} bytes", icon.source, icon.location, mime, icon.bytes.len()))
}

fn key(config: &AppConfig, host: &str) -> Result<String> {
    let (store, host) = open_store(config, host)?;
    Ok(store.path_for(&host)?.display().to_string())
}

fn purge(config: &AppConfig, host: &str) -> Result<String> {
    let (store, host) = open_store(config, host)?;
    let removed = store.purge(&host)?;
    tracing::info!(host, removed, "purge finished");
    Ok(if removed { format!("purged {host}") } else { format!("no entry for {host}") })
}

/// Open the cache and reduce `input` to the `host[:port]` the edge service keys on.
fn open_store(config: &AppConfig, input: &str) -> Result<(CacheStore, String)> {
    let secret = config.require_secret_key()?;
    let store = CacheStore::open(&config.cache_dir, secret.as_bytes())?;
    let host = normalize(input)?.authority().to_string();
    Ok((store, host))
}
