//! Unified error types for favcache.
//!
//! Every variant displays as `CODE: message` so callers can log or surface the
//! code without matching on the enum.

/// Unified error type shared by the cache store, resolver and edge service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty host key).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Unparseable URL or unsupported scheme. Never retried.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// DNS, TLS, timeout, redirect-limit or non-2xx/3xx status.
    #[error("TRANSPORT_FAILURE: {0}")]
    TransportFailure(String),

    /// Response body is not a recognized image format.
    #[error("NOT_AN_IMAGE: {0}")]
    NotAnImage(String),

    /// Every resolution strategy failed.
    #[error("EXHAUSTED: {0}")]
    Exhausted(String),

    /// Cache directory, lock or file operation failed.
    #[error("CACHE_IO: {context}: {source}")]
    CacheIo {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error from the cache store with the path or step that failed.
    pub fn cache_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::CacheIo { context: context.into(), source }
    }

    /// Short machine-readable code, matching the display prefix.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::TransportFailure(_) => "TRANSPORT_FAILURE",
            Error::NotAnImage(_) => "NOT_AN_IMAGE",
            Error::Exhausted(_) => "EXHAUSTED",
            Error::CacheIo { .. } => "CACHE_IO",
        }
    }
}
