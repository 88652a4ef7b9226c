//! Favicon resolution through an ordered fallback chain.
//!
//! ### Default chain
//! 1. File map: static host overrides (local file or remote URL)
//! 2. HTML discovery: `<link rel="icon">` on the origin page
//! 3. Root icon: `{host_root}/favicon.ico`
//! 4. Redirected root: `/favicon.ico` on the host the origin page redirected to
//! 5. External fallback: a favicon-by-domain web service
//!
//! Strategies run one at a time and the first success wins. A strategy never
//! fails the resolution; it either finds an icon or lets the next one try.
//! Values that one strategy learns for a later one (the redirect target) are
//! returned through [`Attempt`] and handed forward in [`StrategyInput`].

pub mod external;
pub mod file_map;
pub mod html;
pub mod root;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use favcache_core::{AppConfig, Error};

use crate::fetch::{Fetch, FetchClient, FetchConfig};
use crate::origin::{HostRoot, OriginRequest, UrlError};

pub use external::ExternalApiStrategy;
pub use file_map::{FileMapStrategy, MapTarget};
pub use html::HtmlDiscoveryStrategy;
pub use root::{RedirectedRootStrategy, RootIconStrategy};

/// Which strategy produced an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSource {
    FileMap,
    HtmlLink,
    RootIcon,
    RedirectRootIcon,
    ExternalApiFallback,
}

impl IconSource {
    pub fn as_str(self) -> &'static str {
        match self {
            IconSource::FileMap => "file_map",
            IconSource::HtmlLink => "html_link",
            IconSource::RootIcon => "root_icon",
            IconSource::RedirectRootIcon => "redirect_root_icon",
            IconSource::ExternalApiFallback => "external_api_fallback",
        }
    }
}

impl fmt::Display for IconSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The winning icon of a resolution.
#[derive(Debug, Clone)]
pub struct IconCandidate {
    pub source: IconSource,
    pub bytes: Bytes,
    /// Where the bytes came from: a URL or a local path.
    pub location: String,
}

/// What a strategy sees when it runs.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    pub origin: &'a OriginRequest,
    /// Host root the origin page redirected to, when it differs from the origin's.
    pub redirected_root: Option<&'a HostRoot>,
}

/// Outcome of one strategy.
#[derive(Debug)]
pub enum Attempt {
    Found(IconCandidate),
    Missed,
    /// Nothing found, but the origin page lives under another host root.
    Redirected(HostRoot),
}

/// One step of the fallback chain.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn source(&self) -> IconSource;

    async fn attempt(&self, input: StrategyInput<'_>, fetcher: &dyn Fetch) -> Attempt;
}

/// Error type for resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    #[error("no favicon found for {host_root}")]
    Exhausted { host_root: String },
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidUrl(e) => e.into(),
            ResolveError::Exhausted { host_root } => Error::Exhausted(host_root),
        }
    }
}

/// Runs the fallback chain for a URL.
pub struct Resolver {
    fetcher: Arc<dyn Fetch>,
    chain: Vec<Box<dyn Strategy>>,
}

impl Resolver {
    pub fn new(fetcher: Arc<dyn Fetch>, chain: Vec<Box<dyn Strategy>>) -> Self {
        Self { fetcher, chain }
    }

    /// The standard five-step chain.
    pub fn default_chain(file_map: FileMapStrategy, fallback_api: &str) -> Vec<Box<dyn Strategy>> {
        vec![
            Box::new(file_map),
            Box::new(HtmlDiscoveryStrategy),
            Box::new(RootIconStrategy),
            Box::new(RedirectedRootStrategy),
            Box::new(ExternalApiStrategy::new(fallback_api)),
        ]
    }

    /// Build a network-backed resolver with the default chain.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let fetcher = FetchClient::new(FetchConfig::from(config))?;
        let file_map = FileMapStrategy::from_rules(&config.file_map)
            .map_err(|e| Error::InvalidInput(format!("file_map: {e}")))?;
        if !file_map.is_empty() {
            tracing::info!(rules = file_map.len(), "file map overrides loaded");
        }
        Ok(Self::new(Arc::new(fetcher), Self::default_chain(file_map, &config.fallback_api)))
    }

    /// Sources of the configured strategies, in execution order.
    pub fn sources(&self) -> Vec<IconSource> {
        self.chain.iter().map(|s| s.source()).collect()
    }

    /// Resolve the favicon for `origin_url` (a URL or bare domain).
    pub async fn resolve(&self, origin_url: &str) -> Result<IconCandidate, ResolveError> {
        let origin = OriginRequest::parse(origin_url)?;
        self.resolve_request(&origin).await
    }

    pub async fn resolve_request(&self, origin: &OriginRequest) -> Result<IconCandidate, ResolveError> {
        let mut redirected_root: Option<HostRoot> = None;

        for strategy in &self.chain {
            let input = StrategyInput { origin, redirected_root: redirected_root.as_ref() };
            match strategy.attempt(input, self.fetcher.as_ref()).await {
                Attempt::Found(candidate) => {
                    tracing::info!(
                        host_root = %origin.host_root,
                        source = %candidate.source,
                        location = %candidate.location,
                        bytes = candidate.bytes.len(),
                        "favicon resolved"
                    );
                    return Ok(candidate);
                }
                Attempt::Redirected(root) => {
                    tracing::debug!(
                        host_root = %origin.host_root,
                        redirected = %root,
                        source = %strategy.source(),
                        "strategy missed, redirect observed"
                    );
                    redirected_root = Some(root);
                }
                Attempt::Missed => {
                    tracing::debug!(host_root = %origin.host_root, source = %strategy.source(), "strategy missed");
                }
            }
        }

        tracing::info!(host_root = %origin.host_root, "all favicon strategies exhausted");
        Err(ResolveError::Exhausted { host_root: origin.host_root.to_string() })
    }
}
