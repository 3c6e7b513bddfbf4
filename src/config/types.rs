use crate::url::parse_base_url;
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Trawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    pub rules: RulesConfig,
    pub sink: SinkConfig,
}

impl Config {
    /// Parsed `crawler.base-url`
    pub fn base_url(&self) -> ConfigResult<Url> {
        parse_base_url(&self.crawler.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))
    }

    /// Absolute URL browsing starts from
    ///
    /// `crawler.initial` is resolved against the base URL; without it the
    /// base URL itself is the seed.
    pub fn initial_url(&self) -> ConfigResult<String> {
        let base = self.base_url()?;
        match &self.crawler.initial {
            Some(initial) => base
                .join(initial)
                .map(|url| url.to_string())
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid initial URL: {}", e))),
            None => Ok(base.to_string()),
        }
    }
}

/// Site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Base URL of the site; relative URLs are resolved against it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Where browsing starts, relative to `base-url` (defaults to the base URL)
    #[serde(default)]
    pub initial: Option<String>,
}

/// Pause policy applied when a queue hands out nothing
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    /// First pause (milliseconds)
    #[serde(rename = "base-ms", default = "default_backoff_base_ms")]
    pub base_ms: u64,

    /// Longest pause (milliseconds)
    #[serde(rename = "max-ms", default = "default_backoff_max_ms")]
    pub max_ms: u64,

    /// Consecutive empty dequeues after which a phase gives up
    #[serde(rename = "max-idle-pauses", default = "default_max_idle_pauses")]
    pub max_idle_pauses: u32,
}

impl BackoffConfig {
    pub fn base(&self) -> Duration {
        Duration::from_millis(self.base_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: default_backoff_base_ms(),
            max_ms: default_backoff_max_ms(),
            max_idle_pauses: default_max_idle_pauses(),
        }
    }
}

/// HTTP download settings
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request deadline (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries performed inside a single download call
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry `n` waits `backoff-factor * 2^n` seconds
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Statuses retried inside a download call
    #[serde(rename = "retry-on", default = "default_retry_on")]
    pub retry_on: Vec<u16>,

    /// Pause after every request (milliseconds); robots.txt Crawl-delay wins
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(rename = "ignore-robots-txt", default)]
    pub ignore_robots_txt: bool,

    /// Proxy URLs, switched on transport failure
    #[serde(default)]
    pub proxies: Vec<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            retry_on: default_retry_on(),
            request_delay_ms: default_request_delay_ms(),
            ignore_robots_txt: false,
            proxies: Vec::new(),
            username: None,
            password: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Work queue backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    Memory,
    Sqlite,
}

/// Work queue settings
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_backend")]
    pub backend: QueueBackend,

    /// SQLite database file (sqlite backend only)
    #[serde(default = "default_queue_path")]
    pub path: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_queue_backend(),
            path: default_queue_path(),
        }
    }
}

/// Archive store settings
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_directory")]
    pub directory: String,

    #[serde(default = "default_archive_prefix")]
    pub prefix: String,

    #[serde(default = "default_archive_extension")]
    pub extension: String,

    /// Soft cap on container size (bytes)
    #[serde(rename = "max-size", default = "default_archive_max_size")]
    pub max_size: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            directory: default_archive_directory(),
            prefix: default_archive_prefix(),
            extension: default_archive_extension(),
            max_size: default_archive_max_size(),
        }
    }
}

/// CSS selectors driving the page handler
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Elements whose `href` leads to more listing pages
    #[serde(default = "default_link_selector")]
    pub browsable: String,

    /// Elements whose `href` leads to pages to archive
    #[serde(default = "default_link_selector")]
    pub harvestable: String,

    /// Browsing stops on a page where this selector matches
    #[serde(default)]
    pub stop: Option<String>,

    /// Record field name -> selector of the element holding its text
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Output format of extracted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Jsonl,
    Csv,
    Sqlite,
}

/// Record sink settings
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    pub kind: SinkKind,

    pub path: String,

    /// Column order for csv and sqlite sinks
    #[serde(default)]
    pub columns: Vec<String>,

    /// Destination table (sqlite only)
    #[serde(default)]
    pub table: Option<String>,
}

fn default_backoff_base_ms() -> u64 {
    300
}

fn default_backoff_max_ms() -> u64 {
    30 * 60 * 1000
}

fn default_max_idle_pauses() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("trawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    3
}

fn default_max_retries() -> u32 {
    10
}

fn default_backoff_factor() -> f64 {
    0.3
}

fn default_retry_on() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_queue_backend() -> QueueBackend {
    QueueBackend::Memory
}

fn default_queue_path() -> String {
    "queues.db".to_string()
}

fn default_archive_directory() -> String {
    "harvest".to_string()
}

fn default_archive_prefix() -> String {
    "harvest_".to_string()
}

fn default_archive_extension() -> String {
    "bz2".to_string()
}

fn default_archive_max_size() -> u64 {
    100_000_000
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}
