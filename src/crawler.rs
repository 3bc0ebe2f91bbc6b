use crate::error::{CrawlError, FetchError};
use crate::extractor::extract_page;
use crate::fetcher::{Engine, HttpFetcher, PageFetcher};
use crate::models::PageData;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Pages crawled when the caller does not ask for a specific number
pub const DEFAULT_MAX_PAGES: usize = 10;
/// Upper bound on pages per crawl, whatever the caller asks for
pub const MAX_PAGES_CAP: usize = 50;

/// Options for a single crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Page budget; `None` means [`DEFAULT_MAX_PAGES`], capped at [`MAX_PAGES_CAP`]
    pub max_pages: Option<usize>,
    /// Pace fetches to at most this many per second
    pub requests_per_second: Option<f64>,
    /// Wall-clock limit for the whole crawl
    pub crawl_timeout: Option<Duration>,
    /// Stops the crawl at the next fetch boundary when cancelled
    pub cancel: Option<CancellationToken>,
    pub show_progress: bool,
}

impl CrawlOptions {
    pub fn with_max_pages(max_pages: usize) -> Self {
        Self {
            max_pages: Some(max_pages),
            ..Self::default()
        }
    }
}

/// Resolves the page budget for a crawl
pub fn effective_max_pages(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_MAX_PAGES).clamp(1, MAX_PAGES_CAP)
}

/// Parses and validates the URL a crawl starts from, dropping any fragment
pub fn parse_start_url(start_url: &str) -> Result<Url, CrawlError> {
    let mut url = Url::parse(start_url)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(CrawlError::UnsupportedScheme(scheme.to_string())),
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves `link` against the page it was found on and returns it only if it
/// is an http(s) URL on exactly `root_host`. The fragment is stripped.
pub fn normalize_url(link: &str, base: &Url, root_host: &str) -> Option<Url> {
    let mut url = base.join(link).ok()?;

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    url.set_fragment(None);

    if url.host_str() != Some(root_host) {
        return None;
    }

    Some(url)
}

/// Visited set and FIFO frontier of one crawl
#[derive(Debug, Default)]
struct CrawlState {
    visited: HashSet<String>,
    frontier: VecDeque<Url>,
    queued: HashSet<String>,
}

impl CrawlState {
    fn new(start: Url) -> Self {
        let mut state = Self::default();
        state.enqueue(start);
        state
    }

    /// Adds a URL to the back of the frontier unless it was already visited
    /// or is waiting in the frontier
    fn enqueue(&mut self, url: Url) -> bool {
        if self.visited.contains(url.as_str()) || self.queued.contains(url.as_str()) {
            return false;
        }
        self.queued.insert(url.to_string());
        self.frontier.push_back(url);
        true
    }

    fn dequeue(&mut self) -> Option<Url> {
        let url = self.frontier.pop_front()?;
        self.queued.remove(url.as_str());
        Some(url)
    }
}

/// Breadth-first, same-origin crawler driving a [`PageFetcher`].
///
/// Pages are fetched one at a time. The crawler owns its fetcher and closes it
/// when the crawl ends.
pub struct Crawler<F: PageFetcher> {
    fetcher: F,
    start_url: Url,
    root_host: String,
    max_pages: usize,
    state: CrawlState,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    crawl_timeout: Option<Duration>,
    cancel: CancellationToken,
    progress_bar: Option<ProgressBar>,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F, start_url: Url, options: CrawlOptions) -> Self {
        let root_host = start_url.host_str().unwrap_or_default().to_string();

        let rate_limiter = options
            .requests_per_second
            .filter(|rps| rps.is_finite() && *rps > 0.0)
            .and_then(|rps| Duration::try_from_secs_f64(1.0 / rps).ok())
            .and_then(Quota::with_period)
            .map(RateLimiter::direct);

        let mut crawler = Self {
            fetcher,
            state: CrawlState::new(start_url.clone()),
            start_url,
            root_host,
            max_pages: effective_max_pages(options.max_pages),
            rate_limiter,
            crawl_timeout: options.crawl_timeout,
            cancel: options.cancel.unwrap_or_else(CancellationToken::new),
            progress_bar: None,
        };

        if options.show_progress {
            crawler.enable_progress_bar();
        }

        crawler
    }

    /// Enable progress bar for crawling
    pub fn enable_progress_bar(&mut self) {
        let pb = ProgressBar::new(self.max_pages as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {spinner:.cyan} Crawling: {pos}/{len} pages {msg}")
                .expect("Progress bar template should be valid"),
        );
        self.progress_bar = Some(pb);
    }

    /// Runs the crawl to completion and releases the fetcher.
    ///
    /// Pages that fail to load are left out of the result. The crawl ends when
    /// the frontier is empty, the page budget is spent, the deadline passes or
    /// the cancellation token fires.
    pub async fn crawl(mut self) -> Vec<PageData> {
        tracing::info!(
            url = %self.start_url,
            max_pages = self.max_pages,
            "Starting crawl"
        );

        let pages = self.run().await;

        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!("done, {} analyzable", pages.len()));
        }

        tracing::info!(
            url = %self.start_url,
            visited = self.state.visited.len(),
            pages = pages.len(),
            "Crawl finished"
        );

        self.fetcher.close().await;
        pages
    }

    async fn run(&mut self) -> Vec<PageData> {
        let deadline = self.crawl_timeout.map(|timeout| Instant::now() + timeout);
        let mut pages = Vec::new();

        while self.state.visited.len() < self.max_pages {
            let Some(url) = self.state.dequeue() else {
                break;
            };

            if !self.state.visited.insert(url.to_string()) {
                continue;
            }

            if self.cancel.is_cancelled() {
                tracing::info!(url = %url, "Crawl cancelled");
                break;
            }

            // The throttle wait races cancel and the deadline along with the fetch
            let limiter = self.rate_limiter.as_ref();
            let fetcher = &self.fetcher;
            let throttled_fetch = async {
                if let Some(limiter) = limiter {
                    limiter.until_ready().await;
                }
                tracing::debug!(url = %url, "Fetching page");
                fetcher.fetch(&url).await
            };

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!(url = %url, "Crawl cancelled during fetch");
                    break;
                }
                _ = wait_until(deadline) => {
                    tracing::info!(url = %url, "Crawl deadline reached");
                    break;
                }
                result = throttled_fetch => result,
            };

            match result {
                Ok(rendered) => {
                    let page = extract_page(&rendered, &url);
                    self.queue_links(&page, &url);
                    pages.push(page);
                }
                Err(e) => self.report_failure(&url, &e),
            }

            if let Some(ref pb) = self.progress_bar {
                pb.set_position(self.state.visited.len() as u64);
            }
        }

        pages
    }

    fn queue_links(&mut self, page: &PageData, page_url: &Url) {
        for link in &page.links.all_links {
            if let Some(normalized) = normalize_url(link, page_url, &self.root_host) {
                self.state.enqueue(normalized);
            }
        }
    }

    fn report_failure(&self, url: &Url, error: &FetchError) {
        tracing::warn!(url = %url, error = %error, "Failed to crawl page");
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Crawls a site with the given fetcher.
///
/// Individual page failures never fail the crawl; only an invalid start URL
/// does. The fetcher is closed on every path.
pub async fn crawl<F: PageFetcher>(
    fetcher: F,
    start_url: &str,
    options: CrawlOptions,
) -> Result<Vec<PageData>, CrawlError> {
    let start_url = match parse_start_url(start_url) {
        Ok(url) => url,
        Err(e) => {
            fetcher.close().await;
            return Err(e);
        }
    };

    Ok(Crawler::new(fetcher, start_url, options).crawl().await)
}

/// Launches the requested engine and crawls `start_url` with it
pub async fn crawl_site(
    start_url: &str,
    engine: Engine,
    options: CrawlOptions,
) -> Result<Vec<PageData>, CrawlError> {
    let start = parse_start_url(start_url)?;

    match engine {
        Engine::Http => Ok(Crawler::new(HttpFetcher::new()?, start, options)
            .crawl()
            .await),
        #[cfg(feature = "browser")]
        Engine::Browser => {
            let fetcher = crate::browser::BrowserFetcher::launch().await?;
            Ok(Crawler::new(fetcher, start, options).crawl().await)
        }
        #[cfg(not(feature = "browser"))]
        Engine::Browser => Err(CrawlError::EngineLaunch(
            "built without headless browser support".to_string(),
        )),
    }
}

/// Fetches and extracts a single page without following any links
pub async fn scrape_page<F: PageFetcher>(fetcher: F, url: &str) -> Result<PageData, CrawlError> {
    let url = match parse_start_url(url) {
        Ok(url) => url,
        Err(e) => {
            fetcher.close().await;
            return Err(e);
        }
    };

    let result = fetcher.fetch(&url).await;
    fetcher.close().await;

    match result {
        Ok(rendered) => Ok(extract_page(&rendered, &url)),
        Err(source) => Err(CrawlError::Scrape {
            url: url.to_string(),
            source,
        }),
    }
}

/// Launches the requested engine and analyzes `url` alone
pub async fn scrape_url(url: &str, engine: Engine) -> Result<PageData, CrawlError> {
    parse_start_url(url)?;

    match engine {
        Engine::Http => scrape_page(HttpFetcher::new()?, url).await,
        #[cfg(feature = "browser")]
        Engine::Browser => scrape_page(crate::browser::BrowserFetcher::launch().await?, url).await,
        #[cfg(not(feature = "browser"))]
        Engine::Browser => Err(CrawlError::EngineLaunch(
            "built without headless browser support".to_string(),
        )),
    }
}
