//! Bounded HTTP fetch with optional image verification.
//!
//! ### Limits
//! - Total and connect timeouts
//! - Max redirects: 5 (configurable)
//! - Max download size requested via `Range: bytes=0-{max-1}`. Origins that
//!   ignore the header may send more; the overshoot is accepted.
//!
//! ### TLS
//! Certificate validation is disabled by default. Favicons are fetched from
//! arbitrary third-party sites, many of which serve broken chains, and the
//! bytes are only ever sniffed and re-served as opaque images. Set
//! `accept_invalid_certs = false` to restore validation.
//!
//! ### Status handling
//! Any transport error or status outside `[200, 400)` is a failure.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url, header};
use std::time::{Duration, Instant};

use favcache_core::{AppConfig, Error, IconFormat};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string; a desktop browser string by default.
    pub user_agent: String,

    /// Bytes requested via the Range header (default: 1MB)
    pub max_bytes: usize,

    /// Total request timeout (default: 10s)
    pub timeout: Duration,

    /// Connect timeout (default: 5s)
    pub connect_timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Skip TLS certificate validation (default: true)
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            max_redirects: config.max_redirects,
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}

/// Whether a fetched body must sniff as an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verify {
    None,
    Image,
}

/// Error type for fetch failures.
///
/// Failures that happened after a response arrived keep the final URL so
/// callers can tell where redirects ended up.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("status {status} from {final_url}")]
    Status { status: u16, final_url: Url },

    #[error("not an image: {final_url}")]
    NotAnImage { final_url: Url },
}

impl FetchError {
    /// URL of the last response, if one was received.
    pub fn final_url(&self) -> Option<&Url> {
        match self {
            FetchError::Status { final_url, .. } | FetchError::NotAnImage { final_url } => Some(final_url),
            FetchError::InvalidUrl(_) | FetchError::Transport(_) => None,
        }
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl(msg) => Error::InvalidUrl(msg),
            FetchError::NotAnImage { final_url } => Error::NotAnImage(final_url.to_string()),
            other => Error::TransportFailure(other.to_string()),
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Sniffed image format, set once the body has been verified
    pub image: Option<IconFormat>,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Require the body to sniff as a known image format.
    pub fn verify_image(mut self) -> Result<Self, FetchError> {
        match IconFormat::sniff(&self.bytes) {
            Some(format) => {
                self.image = Some(format);
                Ok(self)
            }
            None => Err(FetchError::NotAnImage { final_url: self.final_url }),
        }
    }
}

/// A source of HTTP responses.
///
/// [`FetchClient`] is the network implementation; the resolver only depends
/// on this trait.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url`, following redirects. Statuses outside `[200, 400)` are errors.
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;

    /// GET `url` and optionally require an image body.
    async fn fetch(&self, url: &str, verify: Verify) -> Result<FetchResponse, FetchError> {
        let response = self.get(url).await?;
        match verify {
            Verify::None => Ok(response),
            Verify::Image => response.verify_image(),
        }
    }
}

/// HTTP fetch client with size, time and redirect limits.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .use_rustls_tls()
            .http1_only()
            .pool_max_idle_per_host(0)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::TransportFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Value of the Range header sent with every request.
    pub fn range_header(&self) -> String {
        format!("bytes=0-{}", self.config.max_bytes.saturating_sub(1))
    }
}

#[async_trait]
impl Fetch for FetchClient {
    async fn get(&self, url_str: &str) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let url = Url::parse(url_str).map_err(|e| FetchError::InvalidUrl(format!("{url_str}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!("unsupported scheme in {url_str}")));
        }

        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "image/avif,image/webp,image/*,text/html;q=0.9,*/*;q=0.8")
            .header(header::RANGE, self.range_header())
            .header(header::CONNECTION, "close")
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !(200..400).contains(&status.as_u16()) {
            tracing::debug!("fetch {} -> {} failed with status {}", url, final_url, status.as_u16());
            return Err(FetchError::Status { status: status.as_u16(), final_url });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read response from {final_url}: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            tracing::debug!(
                "{} ignored the range request: {} bytes exceeds {}",
                final_url,
                bytes.len(),
                self.config.max_bytes
            );
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse { url, final_url, status, content_type, bytes, image: None, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x10";

    fn response(bytes: &'static [u8]) -> FetchResponse {
        FetchResponse {
            url: Url::parse("https://example.com/favicon.ico").unwrap(),
            final_url: Url::parse("https://www.example.com/favicon.ico").unwrap(),
            status: StatusCode::OK,
            content_type: None,
            bytes: Bytes::from_static(bytes),
            image: None,
            fetch_ms: 3,
        }
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.max_bytes, 1_048_576);
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.connect_timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_tls_validation_disabled_by_default() {
        assert!(FetchConfig::default().accept_invalid_certs);
    }

    // Only the client build is covered for both settings. wiremock serves
    // plain HTTP, so no self-signed handshake is exercised here.
    #[tokio::test]
    async fn test_fetch_client_new_with_and_without_tls_validation() {
        assert!(FetchClient::new(FetchConfig::default()).is_ok());
        let strict = FetchConfig { accept_invalid_certs: false, ..Default::default() };
        assert!(FetchClient::new(strict).is_ok());
    }

    #[test]
    fn test_range_header() {
        let client = FetchClient::new(FetchConfig { max_bytes: 4096, ..Default::default() }).unwrap();
        assert_eq!(client.range_header(), "bytes=0-4095");
    }

    #[test]
    fn test_verify_image_accepts_png() {
        let verified = response(PNG).verify_image().unwrap();
        assert_eq!(verified.image, Some(IconFormat::Png));
    }

    #[test]
    fn test_verify_image_rejects_html() {
        let err = response(b"<html><body>404</body></html>").verify_image().unwrap_err();
        assert!(matches!(err, FetchError::NotAnImage { .. }));
        assert_eq!(err.final_url().unwrap().as_str(), "https://www.example.com/favicon.ico");
    }

    #[test]
    fn test_fetch_error_into_core_error() {
        let core: Error = FetchError::Transport("dns".into()).into();
        assert!(matches!(core, Error::TransportFailure(_)));
        let core: Error = response(b"").verify_image().unwrap_err().into();
        assert!(matches!(core, Error::NotAnImage(_)));
    }

    #[tokio::test]
    async fn test_fetch_sends_limits_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .and(header_is("range", "bytes=0-1048575"))
            .and(header_is("connection", "close"))
            .and(header_is("user-agent", "favcache-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            FetchClient::new(FetchConfig { user_agent: "favcache-test/1.0".into(), ..Default::default() }).unwrap();
        let response = client
            .fetch(&format!("{}/favicon.ico", server.uri()), Verify::Image)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.image, Some(IconFormat::Png));
        assert_eq!(&response.bytes[..], PNG);
    }

    #[tokio::test]
    async fn test_fetch_accepts_partial_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(PNG))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let response = client.fetch(&format!("{}/favicon.ico", server.uri()), Verify::Image).await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_tolerates_overshoot() {
        let server = MockServer::start().await;
        let mut big = PNG.to_vec();
        big.resize(64, 0);
        Mock::given(method("GET"))
            .and(path("/big.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(big))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig { max_bytes: 16, ..Default::default() }).unwrap();
        let response = client.fetch(&format!("{}/big.png", server.uri()), Verify::Image).await.unwrap();
        assert_eq!(response.bytes.len(), 64);
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.ico"))
            .respond_with(ResponseTemplate::new(404).set_body_bytes(PNG))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let err = client.get(&format!("{}/missing.ico", server.uri())).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_image_when_verifying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>soft 404</html>"))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = format!("{}/favicon.ico", server.uri());

        assert!(client.fetch(&url, Verify::None).await.is_ok());
        let err = client.fetch(&url, Verify::Image).await.unwrap_err();
        assert!(matches!(err, FetchError::NotAnImage { .. }));
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let response = client.get(&format!("{}/old", server.uri())).await.unwrap();
        assert_eq!(response.final_url.path(), "/new");
        assert_eq!(response.url.path(), "/old");
    }

    #[tokio::test]
    async fn test_fetch_redirect_limit_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", format!("{}/loop", server.uri())))
            .mount(&server)
            .await;

        let client = FetchClient::new(FetchConfig { max_redirects: 2, ..Default::default() }).unwrap();
        let err = client.get(&format!("{}/loop", server.uri())).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_scheme() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let err = client.get("ftp://example.com/favicon.ico").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
