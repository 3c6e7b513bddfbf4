//! Trawl: a breadth-first crawl engine
//!
//! This crate walks a website from a seed URL, separates pages worth
//! exploring from pages worth keeping, archives the latter into rolling
//! compressed containers and finally turns archived pages into records.
//! Site-specific logic (which links to follow, when to stop, how to build a
//! record) is supplied by the embedder through [`extract::PageHandler`].

pub mod archive;
pub mod config;
pub mod crawler;
pub mod download;
pub mod extract;
pub mod queue;
pub mod robots;
pub mod sink;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("Download error: {0}")]
    Download(#[from] download::DownloadError),

    #[error("Page handler error: {0}")]
    Handler(#[from] extract::HandlerError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PhaseState,
        to: state::PhaseState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use archive::{ArchiveStore, MemoryArchiveStore, ZipArchiveStore};
pub use config::Config;
pub use crawler::{Backoff, Browser, Phase, PhaseReport};
pub use download::{DownloadOutcome, Downloader, HttpDownloader};
pub use extract::{Page, PageHandler, Record, SelectorHandler};
pub use queue::{MemoryQueue, SqliteQueue, WorkQueue};
pub use sink::{CsvSink, JsonLinesSink, MemorySink, RecordSink, SqliteSink};
pub use state::PhaseState;
pub use crate::url::{page_id, resolve_link};
