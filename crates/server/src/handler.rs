//! Shared state and routing for the edge service.

use axum::Router;
use axum::routing::get;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use favcache_client::Resolver;
use favcache_core::{AppConfig, CacheStore, Error, fingerprint};

use crate::routes;

/// Everything a request needs, cloned into each handler.
#[derive(Clone)]
pub struct IconServer {
    pub resolver: Arc<Resolver>,
    pub cache: Arc<CacheStore>,
    pub placeholder: Bytes,
    pub placeholder_fingerprint: Arc<str>,
    pub ttl: Duration,
}

impl IconServer {
    pub fn new(resolver: Resolver, cache: CacheStore, placeholder: Bytes, ttl: Duration) -> Self {
        let placeholder_fingerprint = fingerprint(&placeholder).into();
        Self { resolver: Arc::new(resolver), cache: Arc::new(cache), placeholder, placeholder_fingerprint, ttl }
    }

    /// Wire up the cache, placeholder icon and network resolver from config.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let secret = config.require_secret_key()?;
        let placeholder = config.load_default_icon()?;
        let cache = CacheStore::open(&config.cache_dir, secret.as_bytes())?;
        let resolver = Resolver::from_config(config)?;

        tracing::info!(
            cache_dir = %config.cache_dir.display(),
            ttl_secs = config.ttl_secs,
            placeholder_bytes = placeholder.len(),
            "edge service configured"
        );

        Ok(Self::new(resolver, cache, Bytes::from(placeholder), config.ttl()))
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(routes::icon::serve_icon))
            .route("/health", get(routes::health::health))
            .with_state(self)
    }

    /// Cached bytes for `host` and when they expire.
    pub async fn lookup(&self, host: &str) -> Result<Option<(Vec<u8>, DateTime<Utc>)>, Error> {
        let server = self.clone();
        let host = host.to_string();
        run_blocking(move || {
            let fp = &server.placeholder_fingerprint;
            let Some(bytes) = server.cache.get(&host, fp, server.ttl)? else {
                return Ok(None);
            };
            let expires = server.cache.expiry_timestamp(&host, fp, server.ttl)?;
            Ok(expires.map(|at| (bytes, at)))
        })
        .await
    }

    pub async fn store(&self, host: &str, bytes: Bytes) -> Result<(), Error> {
        let cache = self.cache.clone();
        let host = host.to_string();
        run_blocking(move || cache.set(&host, &bytes).map(|_| ())).await
    }
}

/// Cache calls take file locks, so they stay off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::cache_io("cache task", std::io::Error::other(e)))?
}
