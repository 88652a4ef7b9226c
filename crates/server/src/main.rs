//! favcache edge service entry point.
//!
//! Serves favicons over HTTP from the disk cache, resolving on a miss.
//! Logs are JSON on stderr, filtered by `RUST_LOG`.

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use favcache_core::AppConfig;

mod error;
mod handler;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let server = handler::IconServer::from_config(&config)?;

    let listener = TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "favcache edge service listening");

    axum::serve(listener, server.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("favcache edge service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
