//! Headless Chromium page fetcher.
//!
//! One browser process is launched per crawl and every page of that crawl is
//! opened in a single isolated browser context, so cookies and storage never
//! leak between crawls. The process is shut down in [`PageFetcher::close`].

use crate::error::{CrawlError, FetchError};
use crate::fetcher::{NAVIGATION_TIMEOUT, PageFetcher, RenderedPage};
use crate::http_client::USER_AGENT;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use url::Url;

/// How long to keep draining network events for the document response once
/// navigation has completed
const STATUS_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle event fired once a frame has had no network activity for 500 ms
const NETWORK_IDLE: &str = "networkIdle";

pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    context_id: BrowserContextId,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launches a headless browser and opens a fresh context for this crawl
    pub async fn launch() -> Result<Self, CrawlError> {
        Self::launch_with_timeout(NAVIGATION_TIMEOUT).await
    }

    pub async fn launch_with_timeout(timeout: Duration) -> Result<Self, CrawlError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg(format!("--user-agent={}", USER_AGENT))
            .request_timeout(timeout)
            .build()
            .map_err(CrawlError::EngineLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::EngineLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser handler event error");
                }
            }
        });

        let context_id = match browser
            .execute(CreateBrowserContextParams::default())
            .await
        {
            Ok(response) => response.result.browser_context_id,
            Err(e) => {
                let err = CrawlError::EngineLaunch(e.to_string());
                shutdown(browser, handler).await;
                return Err(err);
            }
        };

        tracing::debug!("Headless browser launched");

        Ok(Self {
            browser,
            handler,
            context_id,
            timeout,
        })
    }

    async fn open_page(&self) -> Result<Page, FetchError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.context_id.clone())
            .build()
            .map_err(FetchError::Browser)?;

        self.browser
            .new_page(params)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }

    async fn render(&self, page: &Page, url: &Url) -> Result<RenderedPage, FetchError> {
        if let Err(e) = page.execute(EnableParams::default()).await {
            tracing::warn!(url = %url, error = %e, "Failed to enable network events");
        }

        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        if let Err(e) = page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await
        {
            tracing::warn!(url = %url, error = %e, "Failed to enable lifecycle events");
        }

        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let started = Instant::now();

        // Load, then wait for the main frame to go network idle, all within the timeout
        let navigation = async {
            page.goto(url.as_str())
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;

            let main_frame = page.mainframe().await.ok().flatten();
            let main_frame = main_frame.as_ref().map(|frame| frame.inner().as_str());

            while let Some(event) = lifecycle.next().await {
                if is_network_idle(&event.name, event.frame_id.inner(), main_frame) {
                    break;
                }
            }
            Ok::<(), FetchError>(())
        };

        match tokio::time::timeout(self.timeout, navigation).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout(self.timeout.as_secs())),
        }

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        let load_time_ms = started.elapsed().as_millis() as u64;

        // The first document response is the navigation response, redirects included
        let status = tokio::time::timeout(STATUS_DRAIN_TIMEOUT, async {
            while let Some(event) = responses.next().await {
                if event.r#type == ResourceType::Document {
                    return Some(event.response.status);
                }
            }
            None
        })
        .await
        .ok()
        .flatten();

        let status_code = status
            .and_then(|s| u16::try_from(s).ok())
            .ok_or(FetchError::NoResponse)?;

        Ok(RenderedPage {
            html,
            status_code,
            load_time_ms,
        })
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let page = self.open_page().await?;
        let result = self.render(&page, url).await;

        if let Err(e) = page.close().await {
            tracing::warn!(url = %url, error = %e, "Failed to close page");
        }

        result
    }

    async fn close(self) {
        if let Err(e) = self
            .browser
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await
        {
            tracing::warn!(error = %e, "Failed to dispose browser context");
        }
        shutdown(self.browser, self.handler).await;
    }
}

async fn shutdown(mut browser: Browser, handler: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "Failed to close browser");
    }
    if let Err(e) = browser.wait().await {
        tracing::warn!(error = %e, "Failed to wait for browser exit");
    }
    handler.abort();
    tracing::debug!("Headless browser closed");
}

/// Whether a lifecycle event means the page has settled. Subframes going idle
/// do not count once the main frame is known.
fn is_network_idle(name: &str, frame_id: &str, main_frame: Option<&str>) -> bool {
    name == NETWORK_IDLE && main_frame.is_none_or(|main| main == frame_id)
}
