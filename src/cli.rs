use crate::crawler::DEFAULT_MAX_PAGES;
use crate::fetcher::Engine;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "sitegrade")]
#[command(about = "Crawl a website and score its on-page SEO", long_about = None)]
pub struct Cli {
    /// The URL to start crawling from (a bare domain is treated as https)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Maximum number of pages to crawl (1-50)
    #[arg(short, long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub output: String,

    /// Save report to file
    #[arg(short, long)]
    pub save: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Engine used to load pages
    #[arg(short, long, value_enum, default_value_t = Engine::Browser)]
    pub engine: Engine,

    /// Rate limit for requests per second (optional, e.g., 1.0 for 1 req/s)
    #[arg(short = 'r', long)]
    pub rate_limit: Option<f64>,

    /// Stop the crawl after this many seconds and report what was gathered
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Analyze only the given URL without following links
    #[arg(long)]
    pub single: bool,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long)]
    pub config: Option<String>,
}
