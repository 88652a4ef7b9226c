//! Last-resort lookup through a favicon-by-domain web service.

use async_trait::async_trait;

use super::{Attempt, IconCandidate, IconSource, Strategy, StrategyInput};
use crate::fetch::{Fetch, Verify};
use crate::origin::HostRoot;

/// Queries an external service whose URL template holds one `{}` placeholder
/// for the percent-encoded host root.
#[derive(Debug, Clone)]
pub struct ExternalApiStrategy {
    template: String,
}

impl ExternalApiStrategy {
    pub fn new(template: &str) -> Self {
        Self { template: template.to_string() }
    }

    pub fn lookup_url(&self, host_root: &HostRoot) -> String {
        self.template.replacen("{}", &urlencoding::encode(host_root.as_str()), 1)
    }
}

#[async_trait]
impl Strategy for ExternalApiStrategy {
    fn source(&self) -> IconSource {
        IconSource::ExternalApiFallback
    }

    async fn attempt(&self, input: StrategyInput<'_>, fetcher: &dyn Fetch) -> Attempt {
        let url = self.lookup_url(&input.origin.host_root);
        match fetcher.fetch(&url, Verify::Image).await {
            Ok(response) => Attempt::Found(IconCandidate {
                source: IconSource::ExternalApiFallback,
                bytes: response.bytes,
                location: url,
            }),
            Err(e) => {
                tracing::debug!(url = %url, "external favicon service failed: {e}");
                Attempt::Missed
            }
        }
    }
}
