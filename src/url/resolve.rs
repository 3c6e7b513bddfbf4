use crate::UrlError;
use url::Url;

/// Schemes that never point at a fetchable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Parses the crawl base URL
///
/// Only `http` and `https` URLs are accepted since every other scheme is out
/// of reach for the download gateway.
///
/// # Examples
///
/// ```
/// use trawl::url::parse_base_url;
///
/// let url = parse_base_url("https://example.com/catalogue/").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
/// assert!(parse_base_url("ftp://example.com/").is_err());
/// ```
pub fn parse_base_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Resolves a link found on a page into an absolute URL
///
/// Relative links are joined onto `page_url`. No further canonicalization is
/// done: trailing slashes, query ordering and case are kept exactly as
/// written, so two links are the same work item only if they resolve to the
/// same string.
///
/// Returns None if the link should be excluded:
/// - empty hrefs and fragment-only anchors
/// - javascript:, mailto:, tel: and data: links
/// - hrefs that cannot be joined onto the page URL
/// - non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use trawl::url::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/catalogue/page-1.html").unwrap();
/// assert_eq!(
///     resolve_link("page-2.html", &page).as_deref(),
///     Some("https://example.com/catalogue/page-2.html")
/// );
/// assert_eq!(resolve_link("mailto:me@example.com", &page), None);
/// ```
pub fn resolve_link(href: &str, page_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return None;
    }

    match page_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
