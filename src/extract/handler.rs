//! Page handler trait
//!
//! Site-specific logic lives behind [`PageHandler`]: which links lead to
//! more listing pages, which lead to pages worth archiving, when browsing is
//! finished and how an archived page becomes records.

use crate::extract::Page;
use crate::url::page_id;
use thiserror::Error;

/// A structured record produced from one page
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors raised by page handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Failed to parse page: {0}")]
    Parse(String),
}

/// Site-specific page logic supplied by the embedder
pub trait PageHandler: Send + Sync {
    /// Links to keep exploring, as written in the page
    fn get_browsable(&self, page: &Page) -> Vec<String>;

    /// Links whose pages should be archived, as written in the page
    fn get_harvestable(&self, page: &Page) -> Vec<String>;

    /// Returns true when browsing should end at this page
    ///
    /// The default never stops, leaving queue exhaustion as the only exit.
    fn stop_test(&self, _page: &Page) -> bool {
        false
    }

    /// Archive entry name for a URL
    fn get_page_id(&self, url: &str) -> String {
        page_id(url)
    }

    /// Turns an archived page into zero or more records
    fn parse(&self, page: &Page) -> Result<Vec<Record>, HandlerError>;
}
