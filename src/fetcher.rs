use crate::error::{CrawlError, FetchError};
use crate::http_client::build_http_client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

/// Hard limit for a single page navigation
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully rendered HTML of a page plus how it was served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    pub status_code: u16,
    pub load_time_ms: u64,
}

/// The engine the crawler uses to obtain page HTML.
///
/// An implementation is acquired once per crawl and released with [`PageFetcher::close`]
/// when the crawl ends, whatever the outcome.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<RenderedPage, FetchError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// Which engine to crawl with
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Headless Chromium, renders JavaScript
    #[default]
    Browser,
    /// Plain HTTP GET, static HTML only
    Http,
}

/// Fetches raw HTML over plain HTTP. Suitable for static sites.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, CrawlError> {
        Self::with_timeout(NAVIGATION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CrawlError> {
        let client =
            build_http_client(timeout).map_err(|e| CrawlError::EngineLaunch(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let started = Instant::now();

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout.as_secs())
            } else if e.is_connect() {
                FetchError::Navigation(e.to_string())
            } else {
                FetchError::Http(e)
            }
        })?;
        let status_code = response.status().as_u16();

        if let Some(ct) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let ct_lower = ct.to_lowercase();
            if !ct_lower.contains("text/html") && !ct_lower.contains("application/xhtml") {
                tracing::warn!(
                    url = %url,
                    content_type = %ct,
                    "Non-HTML content type detected, extraction may be empty"
                );
            }
        }

        let html = response.text().await?;

        Ok(RenderedPage {
            html,
            status_code,
            load_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn close(self) {}
}
