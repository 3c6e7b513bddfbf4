//! Download gateway module
//!
//! The orchestrator talks to the network only through [`Downloader`]. A
//! download call never fails with an error; every result is folded into a
//! [`DownloadOutcome`] which the orchestrator classifies:
//!
//! | Outcome | Browse / harvest loop |
//! |---------|-----------------------|
//! | `Allowed(body)` | process the page |
//! | `Denied` | skip, no retry |
//! | `Failed(status)` with [`is_retryable`] | re-enqueue |
//! | `Failed(status)` otherwise | drop with a warning |

mod http;

pub use http::{build_http_client, HttpDownloader};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while setting up a downloader
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },
}

/// Result of a single download call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The page was fetched; carries the response body
    Allowed(Vec<u8>),

    /// Site policy forbids fetching the page
    Denied,

    /// The fetch failed; `None` means no HTTP status was received
    Failed(Option<u16>),
}

impl DownloadOutcome {
    /// Returns true if the orchestrator should put the URL back in its queue
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Failed(status) => is_retryable(*status),
            _ => false,
        }
    }
}

/// Classifies a failed fetch
///
/// A missing status (timeout, connection error), any 5xx, 408 and 429 are
/// transient. Every other status is permanent.
pub fn is_retryable(status: Option<u16>) -> bool {
    match status {
        None => true,
        Some(code) => code >= 500 || code == 408 || code == 429,
    }
}

/// Trait for download gateways
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetches `url`, which may be relative to the site's base URL
    async fn download(&mut self, url: &str) -> DownloadOutcome;

    /// Pause the orchestrator keeps between two requests
    fn delay(&self) -> Duration;

    /// Waits out the inter-request pause
    async fn sleep(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
