//! # Wiki Harvest
//!
//! Crawls a wiki from a seed page, stores every visited page, then mines the
//! stored pages for infobox facts.
//!
//! ## Architecture
//!
//! - **crawl**: Resumable, bounded crawl controller (frontier, links, checkpoints)
//! - **extract**: Infobox parser and directory-level fact extraction
//! - **fetch**: HTTP page fetching
//! - **document**: Parsed markup and text accessors
//! - **storage**: Page, record and checkpoint files
//! - **config**: Configuration loading and validation
//! - **logging**: Tracing subscriber setup

pub mod config;
pub mod crawl;
pub mod document;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod storage;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(n) = s.strip_suffix("ms") {
        return n.parse().ok().map(Duration::from_millis);
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}
