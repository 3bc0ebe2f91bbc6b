#[cfg(feature = "browser")]
pub mod browser;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod http_client;
pub mod models;
pub mod reporter;
pub mod seo_analyzer;

use anyhow::{Context, Result};
use cli::Cli;
use colored::*;
use config::Config;
use crawler::{CrawlOptions, MAX_PAGES_CAP};
use error::CrawlError;
use reporter::Reporter;
use seo_analyzer::SeoAnalyzer;
use std::path::Path;
use std::time::Duration;

/// Turns user input into a crawlable URL. A bare domain gets `https://`.
pub fn normalize_target(input: &str) -> Result<String> {
    let input = input.trim();

    if input.is_empty() {
        anyhow::bail!("URL must not be empty");
    }

    if input.contains("://") {
        if !input.starts_with("http://") && !input.starts_with("https://") {
            anyhow::bail!("URL must start with http:// or https://");
        }
        return Ok(input.to_string());
    }

    Ok(format!("https://{}", input))
}

/// Applies the config file, if any, underneath the command line arguments
pub fn resolve_args(args: Cli) -> Result<Cli> {
    let config = match &args.config {
        Some(path) => Some(Config::from_file(Path::new(path))?),
        None => Config::from_default_paths()?,
    };

    Ok(match config {
        Some(config) => config.merge_with_cli(&args),
        None => args,
    })
}

pub async fn run(args: Cli) -> Result<()> {
    execute(resolve_args(args)?).await
}

/// Runs the crawl pipeline with arguments that already include the config file
pub async fn execute(args: Cli) -> Result<()> {
    let text_output = args.output != "json";

    let url = normalize_target(&args.url)?;

    if !(1..=MAX_PAGES_CAP).contains(&args.max_pages) {
        anyhow::bail!("Max pages must be between 1 and {}", MAX_PAGES_CAP);
    }

    if text_output {
        println!(
            "{}",
            "Sitegrade - Website Crawler & SEO Scorer"
                .bright_cyan()
                .bold()
        );
        println!("{}", "=".repeat(50).bright_blue());
        println!();
        println!("{} {}", "Starting crawl:".bright_white().bold(), url);
        println!("{} {}", "Max pages:".bright_white().bold(), args.max_pages);
        println!();
    }

    let pages = if args.single {
        vec![crawler::scrape_url(&url, args.engine).await?]
    } else {
        let options = CrawlOptions {
            max_pages: Some(args.max_pages),
            requests_per_second: args.rate_limit,
            crawl_timeout: args.timeout.map(Duration::from_secs),
            cancel: None,
            show_progress: text_output && !args.verbose,
        };
        crawler::crawl_site(&url, args.engine, options).await?
    };

    let site = SeoAnalyzer::score_site(&pages).ok_or_else(|| CrawlError::NoPages {
        url: url.clone(),
    })?;

    let report = Reporter::generate_report(&url, &site, &pages);

    if text_output {
        Reporter::print_text_report(&report);
    } else {
        let json = serde_json::to_string_pretty(&report)?;
        println!("{}", json);
    }

    if let Some(filename) = args.save {
        Reporter::save_json_report(&report, &filename)
            .with_context(|| format!("Failed to save report to {}", filename))?;
    }

    Ok(())
}
