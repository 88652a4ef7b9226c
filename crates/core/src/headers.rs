//! Response headers for a served icon.

use chrono::{DateTime, Duration, Utc};

use crate::sniff::IconFormat;

/// Browser cache lifetime advertised for every served icon.
pub const BROWSER_MAX_AGE_SECS: i64 = 86_400;

/// Content type used when the bytes cannot be sniffed.
pub const FALLBACK_CONTENT_TYPE: &str = "image/x-icon";

pub const ROBOTS_TAG: &str = "noindex, nofollow";

/// The fixed header set emitted alongside icon bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconHeaders {
    pub content_type: &'static str,
    pub cache_control: String,
    pub expires: String,
    pub content_length: usize,
    pub robots: &'static str,
}

impl IconHeaders {
    /// Build headers for `bytes` as served at `now`.
    pub fn for_icon(bytes: &[u8], now: DateTime<Utc>) -> Self {
        let content_type = IconFormat::sniff(bytes).map_or(FALLBACK_CONTENT_TYPE, IconFormat::mime);
        let expires = now + Duration::seconds(BROWSER_MAX_AGE_SECS);

        Self {
            content_type,
            cache_control: format!("public, max-age={BROWSER_MAX_AGE_SECS}"),
            expires: http_date(expires),
            content_length: bytes.len(),
            robots: ROBOTS_TAG,
        }
    }

    /// Header name/value pairs in emission order.
    pub fn pairs(&self) -> [(&'static str, String); 5] {
        [
            ("X-Robots-Tag", self.robots.to_string()),
            ("Content-Type", self.content_type.to_string()),
            ("Cache-Control", self.cache_control.clone()),
            ("Expires", self.expires.clone()),
            ("Content-Length", self.content_length.to_string()),
        ]
    }
}

/// Format a timestamp as an RFC 9110 IMF-fixdate.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
