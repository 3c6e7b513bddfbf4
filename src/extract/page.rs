//! Parsed HTML page handed to page handlers

use scraper::{Html, Selector};
use url::Url;

/// A downloaded page parsed into an HTML document
///
/// Pages read back from the archive have no URL; only their id and body
/// were stored.
pub struct Page {
    url: Option<Url>,
    document: Html,
}

impl Page {
    /// Parses a page fetched from `url`
    pub fn new(url: Url, body: &[u8]) -> Self {
        Self {
            url: Some(url),
            document: parse_body(body),
        }
    }

    /// Parses a page read back from the archive
    pub fn from_archive(body: &[u8]) -> Self {
        Self {
            url: None,
            document: parse_body(body),
        }
    }

    /// URL the page was fetched from, if known
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The parsed document
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Raw `href` values of the elements matching `selector`
    ///
    /// Elements carrying a `download` attribute point at files rather than
    /// pages and are left out. Hrefs are returned as written; resolving them
    /// is up to the caller.
    pub fn hrefs(&self, selector: &Selector) -> Vec<String> {
        self.document
            .select(selector)
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim().to_string())
            .collect()
    }

    /// Trimmed text of the first element matching `selector`
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.document
            .select(selector)
            .next()
            .map(|element| {
                element
                    .text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.is_empty())
    }

    /// Returns true if at least one element matches `selector`
    pub fn matches(&self, selector: &Selector) -> bool {
        self.document.select(selector).next().is_some()
    }
}

fn parse_body(body: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(body))
}
