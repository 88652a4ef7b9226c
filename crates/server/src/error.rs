//! Structured errors for the favcache edge service.
//!
//! Client mistakes map to 400 with the error text as a plain-text body;
//! everything else is a 500 and is logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use favcache_core::Error;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Missing or unusable `url` parameter.
    #[error("INVALID_URL: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(Error),

    #[error("RESPONSE_BUILD: {0}")]
    Response(#[from] axum::http::Error),
}

impl From<Error> for ServeError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidUrl(msg) | Error::InvalidInput(msg) => ServeError::BadRequest(msg),
            other => ServeError::Internal(other),
        }
    }
}

impl ServeError {
    /// Machine-readable code, matching the display prefix.
    pub fn code(&self) -> &'static str {
        match self {
            ServeError::BadRequest(_) => "INVALID_URL",
            ServeError::Internal(e) => e.code(),
            ServeError::Response(_) => "RESPONSE_BUILD",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServeError::Internal(_) | ServeError::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "rejected request");
        }
        (status, self.to_string()).into_response()
    }
}
