//! End-to-end resolution against a local HTTP server.

use std::sync::Arc;

use favcache_client::resolve::FileMapStrategy;
use favcache_client::{FetchClient, FetchConfig, IconSource, ResolveError, Resolver};
use favcache_core::config::FileMapRule;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x10";
const ICO: &[u8] = &[0, 0, 1, 0, 1, 0, 16, 16, 0, 0, 1, 0, 32, 0, 0, 0, 0, 0, 22, 0, 0, 0];

fn resolver(server: &MockServer, rules: &[FileMapRule]) -> Resolver {
    let fetcher = FetchClient::new(FetchConfig::default()).unwrap();
    let fallback = format!("{}/s2/favicons?domain_url={{}}", server.uri());
    let chain = Resolver::default_chain(FileMapStrategy::from_rules(rules).unwrap(), &fallback);
    Resolver::new(Arc::new(fetcher), chain)
}

async fn html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html"))
        .mount(server)
        .await;
}

async fn image(server: &MockServer, route: &str, body: &'static [u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_html_link_resolution() {
    let server = MockServer::start().await;
    html(&server, "/blog/post", r#"<html><head><link rel="icon" href="../static/fav.png"></head></html>"#).await;
    image(&server, "/static/fav.png", PNG).await;

    let icon = resolver(&server, &[]).resolve(&format!("{}/blog/post", server.uri())).await.unwrap();

    assert_eq!(icon.source, IconSource::HtmlLink);
    assert_eq!(icon.location, format!("{}/static/fav.png", server.uri()));
    assert_eq!(&icon.bytes[..], PNG);
}

#[tokio::test]
async fn test_root_icon_when_link_is_broken() {
    let server = MockServer::start().await;
    html(&server, "/", r#"<link rel="shortcut icon" href="/missing.ico">"#).await;
    image(&server, "/favicon.ico", ICO).await;

    let icon = resolver(&server, &[]).resolve(&server.uri()).await.unwrap();
    assert_eq!(icon.source, IconSource::RootIcon);
}

#[tokio::test]
async fn test_external_fallback_receives_encoded_host_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s2/favicons"))
        .and(query_param("domain_url", server.uri()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG))
        .expect(1)
        .mount(&server)
        .await;

    let icon = resolver(&server, &[]).resolve(&format!("{}/page?q=1", server.uri())).await.unwrap();
    assert_eq!(icon.source, IconSource::ExternalApiFallback);
}

#[tokio::test]
async fn test_soft_404_html_is_not_an_icon() {
    let server = MockServer::start().await;
    html(&server, "/favicon.ico", "<html>Not Found</html>").await;

    let err = resolver(&server, &[]).resolve(&server.uri()).await.unwrap_err();
    assert!(matches!(err, ResolveError::Exhausted { .. }));
}

#[tokio::test]
async fn test_remote_file_map_target_wins() {
    let server = MockServer::start().await;
    image(&server, "/override.png", PNG).await;
    html(&server, "/", r#"<link rel="icon" href="/page-icon.ico">"#).await;
    image(&server, "/page-icon.ico", ICO).await;

    let rules = [FileMapRule { pattern: "127\\.0\\.0\\.1".into(), target: format!("{}/override.png", server.uri()) }];
    let icon = resolver(&server, &rules).resolve(&server.uri()).await.unwrap();

    assert_eq!(icon.source, IconSource::FileMap);
    assert_eq!(&icon.bytes[..], PNG);
}
