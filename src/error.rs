//! Error types for fetching and crawling

use thiserror::Error;

/// Failure to obtain a page. The crawler absorbs these and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The page could not be loaded at all (DNS, refused connection, aborted load)
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Navigation did not finish within the allowed time
    #[error("navigation timed out after {0} seconds")]
    Timeout(u64),

    /// Navigation finished without any main document response
    #[error("no response received")]
    NoResponse,

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Browser automation error
    #[error("browser error: {0}")]
    Browser(String),
}

/// Errors surfaced to the caller of a crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The fetching engine could not be started; the crawl never ran
    #[error("failed to launch fetching engine: {0}")]
    EngineLaunch(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid URL scheme '{0}': only http and https are supported")]
    UnsupportedScheme(String),

    /// The crawl finished but produced nothing to analyze
    #[error(
        "no pages could be analyzed for {url}; the site may be blocking crawlers or require login"
    )]
    NoPages { url: String },

    /// Single-page scrape failed
    #[error("scraping {url} failed")]
    Scrape {
        url: String,
        #[source]
        source: FetchError,
    },
}
