//! Image format sniffing from leading bytes.
//!
//! Only the magic bytes are inspected; nothing is decoded or rasterized.

use image::ImageFormat;

/// How far into an `<?xml` prolog we look for the `<svg` root element.
const SVG_PROLOG_WINDOW: usize = 1024;

/// Image formats accepted as favicons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFormat {
    Ico,
    Png,
    Gif,
    Jpeg,
    WebP,
    Bmp,
    Avif,
    Tiff,
    Svg,
}

impl IconFormat {
    /// Identify the image format of `bytes`, or `None` if it is not an image we serve.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        if let Ok(format) = image::guess_format(bytes) {
            return match format {
                ImageFormat::Ico => Some(Self::Ico),
                ImageFormat::Png => Some(Self::Png),
                ImageFormat::Gif => Some(Self::Gif),
                ImageFormat::Jpeg => Some(Self::Jpeg),
                ImageFormat::WebP => Some(Self::WebP),
                ImageFormat::Bmp => Some(Self::Bmp),
                ImageFormat::Avif => Some(Self::Avif),
                ImageFormat::Tiff => Some(Self::Tiff),
                _ => None,
            };
        }

        if is_svg(bytes) { Some(Self::Svg) } else { None }
    }

    /// MIME type emitted in `Content-Type`.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Ico => "image/x-icon",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Avif => "image/avif",
            Self::Tiff => "image/tiff",
            Self::Svg => "image/svg+xml",
        }
    }
}

fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_PROLOG_WINDOW)];
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let start = head.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(head.len());
    let head = &head[start..];

    if starts_with_ignore_case(head, b"<svg") {
        return true;
    }

    starts_with_ignore_case(head, b"<?xml") && head.windows(4).any(|w| w.eq_ignore_ascii_case(b"<svg"))
}

fn starts_with_ignore_case(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack.len() >= prefix.len() && haystack[..prefix.len()].eq_ignore_ascii_case(prefix)
}
