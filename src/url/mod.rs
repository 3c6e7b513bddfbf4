//! URL handling module
//!
//! This module provides link resolution against the page being processed,
//! content-addressed page ids and a couple of helpers for log output.

mod page_id;
mod resolve;

pub use page_id::page_id;
pub use resolve::{parse_base_url, resolve_link};

/// Shortens a URL for log lines
///
/// URLs longer than 50 characters are cut down to their last 45 characters,
/// prefixed with `...`.
pub fn shorten_url(url: &str) -> String {
    let count = url.chars().count();
    if count <= 50 {
        return url.to_string();
    }
    let tail: String = url.chars().skip(count - 45).collect();
    format!("...{}", tail)
}
