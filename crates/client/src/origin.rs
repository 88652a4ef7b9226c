//! URL normalization into host roots and relative href resolution.

use std::fmt;
use url::Url;

/// Error type for URL normalization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid base URL: {0}")]
    InvalidBase(String),
}

impl From<UrlError> for favcache_core::Error {
    fn from(err: UrlError) -> Self {
        favcache_core::Error::InvalidUrl(err.to_string())
    }
}

/// Canonical `scheme://host[:port]` prefix of a URL.
///
/// The scheme is always `http` or `https`, the host is lower-case, and the
/// port is only present when it differs from the scheme's default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostRoot {
    root: String,
    host_start: usize,
}

impl HostRoot {
    /// Take the root of an already-parsed URL.
    pub fn from_url(url: &Url) -> Result<Self, UrlError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UrlError::UnsupportedScheme(scheme.to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| UrlError::InvalidUrl(format!("missing host in {url}")))?
            .to_lowercase();

        let root = match url.port() {
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        };

        Ok(Self { root, host_start: scheme.len() + 3 })
    }

    pub fn as_str(&self) -> &str {
        &self.root
    }

    pub fn scheme(&self) -> &str {
        &self.root[..self.host_start - 3]
    }

    /// `host[:port]`, the unit the cache is keyed on.
    pub fn authority(&self) -> &str {
        &self.root[self.host_start..]
    }

    /// URL of the conventional `/favicon.ico` under this root.
    pub fn favicon_url(&self) -> String {
        format!("{}/favicon.ico", self.root)
    }
}

impl fmt::Display for HostRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)
    }
}

/// A single lookup request, normalized once up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginRequest {
    /// The URL exactly as supplied by the caller.
    pub raw_url: String,
    /// The page to fetch for HTML discovery (scheme defaulted, fragment removed).
    pub page_url: Url,
    pub host_root: HostRoot,
}

impl OriginRequest {
    pub fn parse(raw_url: &str) -> Result<Self, UrlError> {
        let mut page_url = parse_lenient(raw_url)?;
        page_url.set_fragment(None);
        let host_root = HostRoot::from_url(&page_url)?;
        Ok(Self { raw_url: raw_url.to_string(), page_url, host_root })
    }
}

/// Normalize a URL or bare domain to its host root.
///
/// Inputs without a scheme or host are retried with `http://` prepended, so
/// `example.com` becomes `http://example.com`.
pub fn normalize(input: &str) -> Result<HostRoot, UrlError> {
    HostRoot::from_url(&parse_lenient(input)?)
}

fn parse_lenient(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => Ok(url),
        Ok(url) if trimmed.contains("://") => match url.scheme() {
            "http" | "https" => Err(UrlError::InvalidUrl(format!("missing host in {trimmed}"))),
            scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
        },
        Err(e) if trimmed.contains("://") => Err(UrlError::InvalidUrl(e.to_string())),
        _ => {
            let url =
                Url::parse(&format!("http://{trimmed}")).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;
            if url.has_host() { Ok(url) } else { Err(UrlError::InvalidUrl(trimmed.to_string())) }
        }
    }
}

/// Resolve an href found in a page against the page's URL.
///
/// 1. Absolute (`scheme://` before any `/`, `?` or `#`): returned unchanged.
/// 2. Protocol-relative (`//host/...`): base scheme prepended.
/// 3. Root-relative (`/...`): appended to the base root.
/// 4. Plain relative without dot segments: appended to the base directory.
/// 5. Otherwise `.` and `..` segments are collapsed; excess `..` stops at `/`.
pub fn resolve_relative(relative: &str, base: &str) -> Result<String, UrlError> {
    let invalid_base = || UrlError::InvalidBase(base.to_string());
    let base_url = Url::parse(base.trim()).map_err(|_| invalid_base())?;
    let root = HostRoot::from_url(&base_url).map_err(|_| invalid_base())?;
    let relative = relative.trim();

    if has_scheme(relative) {
        return Ok(relative.to_string());
    }

    if relative.starts_with("//") {
        return Ok(format!("{}:{relative}", root.scheme()));
    }

    if relative.starts_with('/') {
        return Ok(format!("{root}{relative}"));
    }

    let dir = base_dir(base_url.path());
    let (path, suffix) = split_suffix(relative);

    if !has_dot_segments(path) {
        return Ok(format!("{root}{dir}/{relative}"));
    }

    let combined = format!("{dir}/{path}");
    let mut stack: Vec<&str> = Vec::new();
    for segment in combined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }

    let ends_in_dir = matches!(path.rsplit('/').next(), Some("" | "." | ".."));
    let trailing = if ends_in_dir && !stack.is_empty() { "/" } else { "" };

    Ok(format!("{root}/{}{trailing}{suffix}", stack.join("/")))
}

/// Everything before the last `/` of a URL path: `/x/y/z.html` -> `/x/y`.
fn base_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// Split `path?query#fragment` into the path and the untouched remainder.
fn split_suffix(relative: &str) -> (&str, &str) {
    let idx = relative.find(['?', '#']).unwrap_or(relative.len());
    relative.split_at(idx)
}

/// `://` counts only in scheme position, not inside a path or query.
fn has_scheme(href: &str) -> bool {
    href.find("://").is_some_and(|idx| !href[..idx].contains(['/', '?', '#']))
}

fn has_dot_segments(path: &str) -> bool {
    path.split('/').any(|segment| segment == "." || segment == "..")
}
