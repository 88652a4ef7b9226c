//! Static host overrides from configuration.

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use std::path::PathBuf;

use favcache_core::config::FileMapRule;

use super::{Attempt, IconCandidate, IconSource, Strategy, StrategyInput};
use crate::fetch::{Fetch, Verify};

/// Where a file-map rule points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapTarget {
    Local(PathBuf),
    Remote(String),
}

impl MapTarget {
    pub fn parse(target: &str) -> Self {
        let target = target.trim();
        let lower = target.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            MapTarget::Remote(target.to_string())
        } else {
            MapTarget::Local(PathBuf::from(target))
        }
    }
}

#[derive(Debug, Clone)]
struct MappedIcon {
    pattern: Regex,
    target: MapTarget,
}

/// Serves icons for hosts matching configured patterns.
///
/// Every matching rule is tried in declaration order; a rule whose target
/// cannot be read or fetched hands over to the next matching rule.
#[derive(Debug, Clone, Default)]
pub struct FileMapStrategy {
    rules: Vec<MappedIcon>,
}

impl FileMapStrategy {
    pub fn from_rules(rules: &[FileMapRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| Ok(MappedIcon { pattern: Regex::new(&rule.pattern)?, target: MapTarget::parse(&rule.target) }))
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    async fn load(target: &MapTarget, fetcher: &dyn Fetch) -> Option<(Bytes, String)> {
        match target {
            MapTarget::Local(path) => match tokio::fs::read(path).await {
                Ok(bytes) if !bytes.is_empty() => Some((Bytes::from(bytes), path.display().to_string())),
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "file map target is empty");
                    None
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "file map target unreadable: {e}");
                    None
                }
            },
            MapTarget::Remote(url) => match fetcher.fetch(url, Verify::Image).await {
                Ok(response) => Some((response.bytes, url.clone())),
                Err(e) => {
                    tracing::warn!(url = %url, "file map target unfetchable: {e}");
                    None
                }
            },
        }
    }
}

#[async_trait]
impl Strategy for FileMapStrategy {
    fn source(&self) -> IconSource {
        IconSource::FileMap
    }

    async fn attempt(&self, input: StrategyInput<'_>, fetcher: &dyn Fetch) -> Attempt {
        let host_root = input.origin.host_root.as_str();

        for rule in self.rules.iter().filter(|rule| rule.pattern.is_match(host_root)) {
            tracing::debug!(host_root, pattern = %rule.pattern, "file map rule matched");
            if let Some((bytes, location)) = Self::load(&rule.target, fetcher).await {
                return Attempt::Found(IconCandidate { source: IconSource::FileMap, bytes, location });
            }
        }

        Attempt::Missed
    }
}
