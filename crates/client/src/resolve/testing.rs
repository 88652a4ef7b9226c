//! In-memory fetcher for strategy and resolver tests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::fetch::{Fetch, FetchError, FetchResponse};

pub(crate) const ICO: &[u8] = &[0, 0, 1, 0, 1, 0, 16, 16, 0, 0, 1, 0, 32, 0, 0, 0, 0, 0, 22, 0, 0, 0];
pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

struct Route {
    final_url: String,
    body: Bytes,
}

/// Serves canned bodies by exact URL; anything else is a 404.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    routes: HashMap<String, Route>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn ok(mut self, url: &str, body: &[u8]) -> Self {
        let route = Route { final_url: url.to_string(), body: Bytes::copy_from_slice(body) };
        self.routes.insert(url.to_string(), route);
        self
    }

    pub(crate) fn page(self, url: &str, html: &str) -> Self {
        self.ok(url, html.as_bytes())
    }

    /// `url` answers after redirecting to `final_url`.
    pub(crate) fn redirect(mut self, url: &str, final_url: &str, html: &str) -> Self {
        let route = Route { final_url: final_url.to_string(), body: Bytes::copy_from_slice(html.as_bytes()) };
        self.routes.insert(url.to_string(), route);
        self
    }

    /// Every URL requested, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for FakeFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        match self.routes.get(url) {
            Some(route) => Ok(FetchResponse {
                url: parsed,
                final_url: Url::parse(&route.final_url).unwrap(),
                status: StatusCode::OK,
                content_type: None,
                bytes: route.body.clone(),
                image: None,
                fetch_ms: 0,
            }),
            None => Err(FetchError::Status { status: 404, final_url: parsed }),
        }
    }
}
