//! `GET /?url=<target>&refresh=<bool>`: serve the favicon for a page.
//!
//! Cache hit → stored bytes with `X-Cache: HIT` and the seconds left before
//! the entry expires. Miss (or `refresh`) → run the resolver, fall back to the
//! placeholder icon when every strategy fails, store the result and answer
//! with `X-Cache: MISS`.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http;
use axum::response::Response;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use favcache_client::{OriginRequest, ResolveError};
use favcache_core::{Error, IconHeaders};

use crate::error::ServeError;
use crate::handler::IconServer;

#[derive(Debug, Default, Deserialize)]
pub struct IconQuery {
    pub url: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

enum CacheStatus {
    Hit { expires: DateTime<Utc> },
    Miss,
}

pub async fn serve_icon(
    State(server): State<IconServer>, Query(query): Query<IconQuery>,
) -> Result<Response, ServeError> {
    let raw_url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ServeError::BadRequest("missing url parameter".into()))?;

    let origin = OriginRequest::parse(raw_url).map_err(Error::from)?;
    let host = origin.host_root.authority();

    if !query.refresh
        && let Some((bytes, expires)) = server.lookup(host).await?
    {
        return icon_response(Bytes::from(bytes), CacheStatus::Hit { expires });
    }

    let bytes = match server.resolver.resolve_request(&origin).await {
        Ok(icon) => icon.bytes,
        Err(ResolveError::Exhausted { host_root }) => {
            tracing::info!(%host_root, "serving placeholder icon");
            server.placeholder.clone()
        }
        Err(e) => return Err(Error::from(e).into()),
    };

    server.store(host, bytes.clone()).await?;
    icon_response(bytes, CacheStatus::Miss)
}

fn icon_response(bytes: Bytes, status: CacheStatus) -> Result<Response, ServeError> {
    let now = Utc::now();
    let mut builder = http::Response::builder();
    for (name, value) in IconHeaders::for_icon(&bytes, now).pairs() {
        builder = builder.header(name, value);
    }

    builder = match status {
        CacheStatus::Hit { expires } => {
            let remaining = (expires - now).num_seconds().max(0);
            builder.header("X-Cache", "HIT").header("X-Cache-Expire", remaining.to_string())
        }
        CacheStatus::Miss => builder.header("X-Cache", "MISS"),
    };

    Ok(builder.body(Body::from(bytes))?)
}
