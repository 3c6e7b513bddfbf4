//! robots.txt module
//!
//! Fetching, evaluating and caching the robots.txt of the crawled site. The
//! orchestrator never sees these rules directly; the HTTP downloader turns
//! them into a `Denied` outcome and a pacing delay.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::RobotsRules;

use reqwest::Client;
use url::Url;

/// Fetches and parses `<base>/robots.txt`
///
/// A missing file (any non-success status) and an unreachable host both
/// yield [`RobotsRules::allow_all`], so a site without robots.txt is crawled
/// without restriction.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `base_url` - Base URL of the crawled site
pub async fn fetch_robots(client: &Client, base_url: &Url) -> RobotsRules {
    let robots_url = match base_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", base_url, e);
            return RobotsRules::allow_all();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not fetch {}, allowing all: {}", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::info!(
            "No robots.txt at {} (HTTP {}), allowing all",
            robots_url,
            response.status().as_u16()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::debug!("Loaded robots.txt from {}", robots_url);
            RobotsRules::from_content(&body)
        }
        Err(e) => {
            tracing::warn!("Could not read {}, allowing all: {}", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}

/// Extracts the product token robots.txt groups are matched against
///
/// `"trawl/0.1 (+https://example.com)"` becomes `"trawl"`.
pub fn product_token(user_agent: &str) -> &str {
    let token = user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("");
    if token.is_empty() {
        "*"
    } else {
        token
    }
}
