//! HTTP download gateway
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with user agent, headers, timeout and proxy
//! - robots.txt checks and crawl-delay discovery
//! - Retry with exponential backoff for configured statuses and transport errors
//! - Proxy rotation when a transport error occurs

use crate::config::DownloadConfig;
use crate::download::{DownloadError, DownloadOutcome, Downloader};
use crate::robots::{fetch_robots, product_token, CachedRobots};
use crate::url::shorten_url;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::Span;
use url::Url;

/// Builds an HTTP client from the download settings
///
/// # Arguments
///
/// * `config` - The download configuration
/// * `proxy` - Proxy URL to route every request through, if any
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(DownloadError)` - A header or the proxy URL was rejected
pub fn build_http_client(
    config: &DownloadConfig,
    proxy: Option<&str>,
) -> Result<Client, DownloadError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| DownloadError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| DownloadError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }

    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    Ok(builder.build()?)
}

/// Download gateway backed by `reqwest`
pub struct HttpDownloader {
    client: Client,
    base_url: Url,
    config: DownloadConfig,
    proxy_index: usize,
    robots: Option<CachedRobots>,
    robots_agent: String,
    delay: Duration,
    span: Span,
}

impl HttpDownloader {
    /// Creates a downloader for the site at `base_url`
    ///
    /// robots.txt is fetched lazily by the first download and refreshed once
    /// the cached copy is older than 24 hours.
    pub fn new(base_url: Url, config: DownloadConfig) -> Result<Self, DownloadError> {
        let proxy = config.proxies.first().map(String::as_str);
        let client = build_http_client(&config, proxy)?;
        let span = tracing::info_span!("downloader", base_url = %base_url);

        if let Some(proxy) = proxy {
            tracing::info!(parent: &span, "Using proxy {}", proxy);
        }
        if !config.headers.is_empty() {
            tracing::info!(parent: &span, "Using {} extra headers", config.headers.len());
        }

        Ok(Self {
            client,
            robots_agent: product_token(&config.user_agent).to_string(),
            delay: Duration::from_millis(config.request_delay_ms),
            base_url,
            config,
            proxy_index: 0,
            robots: None,
            span,
        })
    }

    /// Replaces the tracing span log lines are attached to
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Proxy currently in use
    pub fn current_proxy(&self) -> Option<&str> {
        self.config.proxies.get(self.proxy_index).map(String::as_str)
    }

    fn resolve(&self, url: &str) -> Option<Url> {
        Url::parse(url).or_else(|_| self.base_url.join(url)).ok()
    }

    async fn refresh_robots(&mut self) {
        if self.config.ignore_robots_txt {
            return;
        }
        if self.robots.as_ref().is_some_and(|cached| !cached.is_stale()) {
            return;
        }

        let rules = fetch_robots(&self.client, &self.base_url).await;
        self.delay = match rules.crawl_delay(&self.robots_agent) {
            Some(delay) => {
                tracing::info!(parent: &self.span, "Using robots.txt crawl delay of {:?}", delay);
                delay
            }
            None => Duration::from_millis(self.config.request_delay_ms),
        };
        self.robots = Some(CachedRobots::new(rules));
    }

    fn is_allowed(&self, url: &Url) -> bool {
        match &self.robots {
            Some(cached) => cached.rules.is_allowed(url.as_str(), &self.robots_agent),
            None => true,
        }
    }

    fn rotate_proxy(&mut self) {
        if self.config.proxies.len() < 2 {
            return;
        }

        self.proxy_index = (self.proxy_index + 1) % self.config.proxies.len();
        let proxy = &self.config.proxies[self.proxy_index];
        match build_http_client(&self.config, Some(proxy)) {
            Ok(client) => {
                self.client = client;
                tracing::info!(parent: &self.span, "Now using proxy {}", proxy);
            }
            Err(e) => {
                tracing::warn!(parent: &self.span, "Cannot switch to proxy {}: {}", proxy, e);
            }
        }
    }

    fn retry_wait(&self, attempt: u32) -> Duration {
        let seconds = self.config.backoff_factor * 2f64.powi(attempt as i32);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&mut self, url: &str) -> DownloadOutcome {
        let Some(url) = self.resolve(url) else {
            tracing::warn!(parent: &self.span, "Cannot resolve {} against the base URL", url);
            return DownloadOutcome::Denied;
        };

        self.refresh_robots().await;
        if !self.is_allowed(&url) {
            tracing::info!(
                parent: &self.span,
                "Forbidden to fetch {}",
                shorten_url(url.as_str())
            );
            return DownloadOutcome::Denied;
        }

        let mut attempt = 0;
        loop {
            let mut request = self.client.get(url.clone());
            if let Some(username) = &self.config.username {
                request = request.basic_auth(username, self.config.password.as_ref());
            }

            let status = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.bytes().await {
                            Ok(body) => return DownloadOutcome::Allowed(body.to_vec()),
                            Err(e) => {
                                tracing::warn!(
                                    parent: &self.span,
                                    "Failed to read body of {}: {}",
                                    shorten_url(url.as_str()),
                                    e
                                );
                                None
                            }
                        }
                    } else if self.config.retry_on.contains(&status.as_u16()) {
                        Some(status.as_u16())
                    } else {
                        tracing::debug!(
                            parent: &self.span,
                            "HTTP {} for {}",
                            status.as_u16(),
                            shorten_url(url.as_str())
                        );
                        return DownloadOutcome::Failed(Some(status.as_u16()));
                    }
                }
                Err(e) => {
                    tracing::error!(
                        parent: &self.span,
                        "Failed to download {}: {}",
                        shorten_url(url.as_str()),
                        e
                    );
                    self.rotate_proxy();
                    None
                }
            };

            if attempt >= self.config.max_retries {
                return DownloadOutcome::Failed(status);
            }

            let wait = self.retry_wait(attempt);
            attempt += 1;
            tracing::debug!(
                parent: &self.span,
                "Retrying {} in {:?} ({}/{})",
                shorten_url(url.as_str()),
                wait,
                attempt,
                self.config.max_retries
            );
            tokio::time::sleep(wait).await;
        }
    }

    fn delay(&self) -> Duration {
        self.delay
    }
}
