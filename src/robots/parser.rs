//! robots.txt rule evaluation
//!
//! Allow/disallow matching is delegated to the `robotstxt` crate. The
//! `Crawl-delay` extension is not covered by that crate and is read here.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Rules read from one robots.txt file
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Raw robots.txt body; `None` means every URL is allowed
    body: Option<String>,
}

impl RobotsRules {
    /// Creates rules from a robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            body: Some(content.to_string()),
        }
    }

    /// Rules used when robots.txt is missing or unreachable
    pub fn allow_all() -> Self {
        Self { body: None }
    }

    /// Returns true if these rules place no restriction at all
    pub fn is_allow_all(&self) -> bool {
        self.body.as_deref().map_or(true, |b| b.trim().is_empty())
    }

    /// Checks if `url` may be fetched by `user_agent`
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the page
    /// * `user_agent` - Product token of the crawler
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.body.as_deref() {
            None => true,
            Some(body) if body.trim().is_empty() => true,
            Some(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, user_agent, url)
            }
        }
    }

    /// Gets the `Crawl-delay` that applies to `user_agent`
    ///
    /// A group naming the agent wins over the `*` group. Agent tokens are
    /// compared case-insensitively and match when the configured user agent
    /// contains them.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let body = self.body.as_deref()?;
        let agent = user_agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !in_agent_lines {
                    group.clear();
                }
                group.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Some(delay) = value
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d >= 0.0)
            else {
                continue;
            };

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                specific = specific.or(Some(delay));
            } else if group.iter().any(|ua| ua == "*") {
                wildcard = wildcard.or(Some(delay));
            }
        }

        specific.or(wildcard).map(Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://books.toscrape.com";

    fn url(path: &str) -> String {
        format!("{}{}", URL, path)
    }

    #[test]
    fn test_allow_all() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allow_all());
        assert!(rules.is_allowed(&url("/admin"), "trawl"));
        assert_eq!(rules.crawl_delay("trawl"), None);
    }

    #[test]
    fn test_disallow_all() {
        let rules = RobotsRules::from_content("User-agent: *\nDisallow: /");
        assert!(!rules.is_allowed(&url("/"), "trawl"));
        assert!(!rules.is_allowed(&url("/catalogue/page-1.html"), "trawl"));
    }

    #[test]
    fn test_disallow_prefix() {
        let rules = RobotsRules::from_content("User-agent: *\nDisallow: /private");
        assert!(rules.is_allowed(&url("/catalogue/"), "trawl"));
        assert!(!rules.is_allowed(&url("/private"), "trawl"));
        assert!(!rules.is_allowed(&url("/private/x.html"), "trawl"));
    }

    #[test]
    fn test_agent_specific_group() {
        let rules =
            RobotsRules::from_content("User-agent: trawl\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(!rules.is_allowed(&url("/page"), "trawl"));
        assert!(rules.is_allowed(&url("/page"), "otherbot"));
    }

    #[test]
    fn test_empty_body_allows_everything() {
        let rules = RobotsRules::from_content("   \n");
        assert!(rules.is_allow_all());
        assert!(rules.is_allowed(&url("/x"), "trawl"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let rules = RobotsRules::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(rules.crawl_delay("trawl"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_prefers_specific_agent() {
        let rules = RobotsRules::from_content(
            "User-agent: *\nCrawl-delay: 10\n\nUser-agent: trawl\nCrawl-delay: 2.5",
        );
        assert_eq!(rules.crawl_delay("trawl/0.1"), Some(Duration::from_millis(2500)));
        assert_eq!(rules.crawl_delay("otherbot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let rules = RobotsRules::from_content("User-agent: a-bot\nUser-agent: b-bot\nCrawl-delay: 3");
        assert_eq!(rules.crawl_delay("B-Bot"), Some(Duration::from_secs(3)));
        assert_eq!(rules.crawl_delay("c-bot"), None);
    }

    #[test]
    fn test_crawl_delay_group_without_delay_does_not_leak() {
        let rules = RobotsRules::from_content(
            "User-agent: trawl\nDisallow: /x\n\nUser-agent: *\nCrawl-delay: 4",
        );
        assert_eq!(rules.crawl_delay("trawl"), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_crawl_delay_ignores_garbage() {
        let rules = RobotsRules::from_content("User-agent: *\nCrawl-delay: soon\nCrawl-delay: -1");
        assert_eq!(rules.crawl_delay("trawl"), None);
    }
}
