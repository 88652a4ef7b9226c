//! Favicon `<link>` extraction from HTML documents.

use regex::Regex;
use std::sync::LazyLock;

/// Only the first 256 KiB of a page are scanned; icon links live in `<head>`.
pub const MAX_SCAN_BYTES: usize = 256 * 1024;

/// `rel` values that declare a favicon, compared case-insensitively.
pub const ICON_RELS: &[&str] =
    &["icon", "shortcut icon", "alternate icon", "apple-touch-icon", "apple-touch-icon-precomposed"];

static LINK_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<link\s[^>]*>").expect("invalid link regex"));

static REL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\srel\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#).expect("invalid rel regex")
});

static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\shref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("invalid href regex")
});

/// Find the href of the first favicon `<link>` in `html`.
///
/// Line breaks and tabs are flattened first so attributes split across lines
/// still match. Tags with an empty href are skipped.
pub fn extract_favicon_href(html: &str) -> Option<String> {
    let flattened = capped(html).replace(['\r', '\n', '\t'], " ");

    LINK_TAG
        .find_iter(&flattened)
        .map(|tag| tag.as_str())
        .filter(|tag| attr_value(&REL_ATTR, tag).is_some_and(is_icon_rel))
        .find_map(|tag| attr_value(&HREF_ATTR, tag).map(decode_href).filter(|href| !href.is_empty()))
}

fn capped(html: &str) -> &str {
    if html.len() <= MAX_SCAN_BYTES {
        return html;
    }
    let mut end = MAX_SCAN_BYTES;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    &html[..end]
}

fn attr_value<'t>(pattern: &Regex, tag: &'t str) -> Option<&'t str> {
    let caps = pattern.captures(tag)?;
    caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map(|m| m.as_str())
}

fn is_icon_rel(rel: &str) -> bool {
    let rel = rel.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    ICON_RELS.contains(&rel.as_str())
}

fn decode_href(href: &str) -> String {
    href.trim().replace("&amp;", "&")
}
