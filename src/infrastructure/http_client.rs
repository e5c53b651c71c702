//! HTTP fetching for the crawl engine
//!
//! One GET per call, no retries. Every attempt logs exactly one line with its
//! outcome, latency and size. Failures are classified so callers can decide
//! how to proceed; none of them abort a run.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::constants::{crawling as crawl_defaults, site};
use crate::infrastructure::config::CrawlingConfig;

/// HTTP client configuration for crawling
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    /// Default timeout, applied when a caller does not pass its own
    pub timeout_seconds: u64,
    /// Idle connections kept per host; sized to the largest phase concurrency
    pub pool_max_idle_per_host: usize,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: site::USER_AGENT.to_string(),
            timeout_seconds: crawl_defaults::DEFAULT_REQUEST_TIMEOUT_SECONDS,
            pool_max_idle_per_host: crawl_defaults::DEFAULT_CONCURRENCY,
            follow_redirects: true,
        }
    }
}

impl HttpClientConfig {
    /// Create HttpClientConfig from CrawlingConfig
    pub fn from_crawling_config(config: &CrawlingConfig) -> Self {
        let detail_concurrency = if config.enrich_details {
            config.detail.concurrency
        } else {
            0
        };
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.request_timeout_seconds,
            pool_max_idle_per_host: config.listing.concurrency.max(detail_concurrency).max(1),
            follow_redirects: true,
        }
    }
}

/// A successfully fetched body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
    pub elapsed: Duration,
    pub byte_size: usize,
}

/// Classified fetch failure, scoped to a single attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {code}")]
    HttpStatus { code: u16 },

    #[error("transport failure: {cause}")]
    Transport { cause: String },
}

impl FetchError {
    fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connect"
        } else if err.is_body() || err.is_decode() {
            "body"
        } else if err.is_redirect() {
            "redirect"
        } else {
            "request"
        };
        Self::Transport {
            cause: format!("{kind}: {err}"),
        }
    }
}

/// Single-attempt page fetcher.
///
/// `HttpClient` is the network implementation; `test_utils::StubFetcher`
/// serves canned bodies.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

/// Emit the per-attempt log line shared by all fetchers
pub fn log_fetch_outcome(url: &str, elapsed: Duration, outcome: &Result<FetchedPage, FetchError>) {
    match outcome {
        Ok(page) => info!(
            url,
            elapsed_ms = elapsed.as_millis() as u64,
            bytes = page.byte_size,
            "⬇️  {} - OK {:.2}s • {:.1} KB",
            url,
            elapsed.as_secs_f64(),
            page.byte_size as f64 / 1024.0
        ),
        Err(FetchError::HttpStatus { code }) => warn!(
            url,
            status = code,
            elapsed_ms = elapsed.as_millis() as u64,
            "⚠️  {} - HTTP {} {:.2}s",
            url,
            code,
            elapsed.as_secs_f64()
        ),
        Err(FetchError::Transport { cause }) => warn!(
            url,
            elapsed_ms = elapsed.as_millis() as u64,
            "⚠️  {} - ERROR {}",
            url,
            cause
        ),
    }
}

/// reqwest-backed fetcher; one instance is owned by one pipeline run
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    async fn fetch_once(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        Ok(FetchedPage {
            url: url.to_string(),
            byte_size: bytes.len(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
            elapsed: start.elapsed(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        let outcome = self.fetch_once(url, timeout).await;
        log_fetch_outcome(url, start.elapsed(), &outcome);
        outcome
    }
}
