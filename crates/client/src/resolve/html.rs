//! Icon discovery through the origin page's `<link>` declarations.

use async_trait::async_trait;
use reqwest::Url;

use super::{Attempt, IconCandidate, IconSource, Strategy, StrategyInput};
use crate::extract::extract_favicon_href;
use crate::fetch::{Fetch, Verify};
use crate::origin::{HostRoot, OriginRequest, resolve_relative};

/// Fetches the origin page, follows its first icon `<link>`, and reports
/// where the page redirected to when that is a different host root.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlDiscoveryStrategy;

impl HtmlDiscoveryStrategy {
    fn redirect_target(origin: &OriginRequest, final_url: Option<&Url>) -> Option<HostRoot> {
        let root = HostRoot::from_url(final_url?).ok()?;
        (root != origin.host_root).then_some(root)
    }

    fn missed(redirected: Option<HostRoot>) -> Attempt {
        redirected.map_or(Attempt::Missed, Attempt::Redirected)
    }
}

#[async_trait]
impl Strategy for HtmlDiscoveryStrategy {
    fn source(&self) -> IconSource {
        IconSource::HtmlLink
    }

    async fn attempt(&self, input: StrategyInput<'_>, fetcher: &dyn Fetch) -> Attempt {
        let origin = input.origin;

        let page = match fetcher.fetch(origin.page_url.as_str(), Verify::None).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!(url = %origin.page_url, "origin page fetch failed: {e}");
                return Self::missed(Self::redirect_target(origin, e.final_url()));
            }
        };
        let redirected = Self::redirect_target(origin, Some(&page.final_url));

        let html = String::from_utf8_lossy(&page.bytes);
        let Some(href) = extract_favicon_href(&html) else {
            tracing::debug!(url = %page.final_url, "no icon link on origin page");
            return Self::missed(redirected);
        };

        if href.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
            tracing::debug!(url = %page.final_url, "icon link is an inline data URI, skipping");
            return Self::missed(redirected);
        }

        let icon_url = match resolve_relative(&href, page.final_url.as_str()) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(href = %href, "cannot resolve icon link: {e}");
                return Self::missed(redirected);
            }
        };

        match fetcher.fetch(&icon_url, Verify::Image).await {
            Ok(icon) => {
                Attempt::Found(IconCandidate { source: IconSource::HtmlLink, bytes: icon.bytes, location: icon_url })
            }
            Err(e) => {
                tracing::debug!(url = %icon_url, "linked icon rejected: {e}");
                Self::missed(redirected)
            }
        }
    }
}
