//! Favicon declaration discovery in HTML.
//!
//! ### Approach
//! - First-match heuristic over the raw markup, not a DOM parse.
//! - Input is capped before matching so the scan cost is bounded.
//! - The first `<link>` whose `rel` names an icon wins.

pub mod links;

pub use links::{ICON_RELS, MAX_SCAN_BYTES, extract_favicon_href};
