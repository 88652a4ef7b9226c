//! Favicon discovery for favcache.
//!
//! This crate turns a page URL into favicon bytes: URL normalization, bounded
//! HTTP fetching, `<link>` extraction and the ordered resolution chain shared
//! by the server and CLI.

pub mod extract;
pub mod fetch;
pub mod origin;
pub mod resolve;

pub use extract::extract_favicon_href;
pub use fetch::{Fetch, FetchClient, FetchConfig, FetchError, FetchResponse, Verify};
pub use origin::{HostRoot, OriginRequest, UrlError, normalize, resolve_relative};
pub use resolve::{IconCandidate, IconSource, ResolveError, Resolver, Strategy};
