//! Conventional `/favicon.ico` requests on the origin and redirect roots.

use async_trait::async_trait;

use super::{Attempt, IconCandidate, IconSource, Strategy, StrategyInput};
use crate::fetch::{Fetch, Verify};
use crate::origin::HostRoot;

async fn fetch_favicon_ico(root: &HostRoot, source: IconSource, fetcher: &dyn Fetch) -> Attempt {
    let url = root.favicon_url();
    match fetcher.fetch(&url, Verify::Image).await {
        Ok(response) => Attempt::Found(IconCandidate { source, bytes: response.bytes, location: url }),
        Err(e) => {
            tracing::debug!(url = %url, %source, "favicon.ico request failed: {e}");
            Attempt::Missed
        }
    }
}

/// `/favicon.ico` under the origin's host root.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootIconStrategy;

#[async_trait]
impl Strategy for RootIconStrategy {
    fn source(&self) -> IconSource {
        IconSource::RootIcon
    }

    async fn attempt(&self, input: StrategyInput<'_>, fetcher: &dyn Fetch) -> Attempt {
        fetch_favicon_ico(&input.origin.host_root, IconSource::RootIcon, fetcher).await
    }
}

/// `/favicon.ico` under the host root the origin page redirected to.
///
/// Skipped without a request when no earlier strategy observed a redirect.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectedRootStrategy;

#[async_trait]
impl Strategy for RedirectedRootStrategy {
    fn source(&self) -> IconSource {
        IconSource::RedirectRootIcon
    }

    async fn attempt(&self, input: StrategyInput<'_>, fetcher: &dyn Fetch) -> Attempt {
        match input.redirected_root {
            Some(root) => fetch_favicon_ico(root, IconSource::RedirectRootIcon, fetcher).await,
            None => Attempt::Missed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeFetcher, ICO};
    use super::*;
    use crate::origin::{OriginRequest, normalize};

    #[tokio::test]
    async fn test_root_icon_found() {
        let origin = OriginRequest::parse("https://a.com:8443/deep/page").unwrap();
        let fetcher = FakeFetcher::default().ok("https://a.com:8443/favicon.ico", ICO);

        match RootIconStrategy.attempt(StrategyInput { origin: &origin, redirected_root: None }, &fetcher).await {
            Attempt::Found(icon) => {
                assert_eq!(icon.source, IconSource::RootIcon);
                assert_eq!(icon.location, "https://a.com:8443/favicon.ico");
            }
            other => panic!("expected icon, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_root_icon_missing() {
        let origin = OriginRequest::parse("a.com").unwrap();
        let fetcher = FakeFetcher::default();

        let input = StrategyInput { origin: &origin, redirected_root: None };
        let attempt = RootIconStrategy.attempt(input, &fetcher).await;
        assert!(matches!(attempt, Attempt::Missed));
        assert_eq!(fetcher.calls(), ["http://a.com/favicon.ico"]);
    }

    #[tokio::test]
    async fn test_redirected_root_skipped_without_redirect() {
        let origin = OriginRequest::parse("a.com").unwrap();
        let fetcher = FakeFetcher::default().ok("http://a.com/favicon.ico", ICO);

        let input = StrategyInput { origin: &origin, redirected_root: None };
        let attempt = RedirectedRootStrategy.attempt(input, &fetcher).await;
        assert!(matches!(attempt, Attempt::Missed));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_redirected_root_tries_new_host() {
        let origin = OriginRequest::parse("a.com").unwrap();
        let redirected = normalize("https://www.b.com/landing").unwrap();
        let fetcher = FakeFetcher::default().ok("https://www.b.com/favicon.ico", ICO);

        let input = StrategyInput { origin: &origin, redirected_root: Some(&redirected) };
        match RedirectedRootStrategy.attempt(input, &fetcher).await {
            Attempt::Found(icon) => assert_eq!(icon.source, IconSource::RedirectRootIcon),
            other => panic!("expected icon, got {other:?}"),
        }
    }
}
