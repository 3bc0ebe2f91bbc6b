use crate::models::{CrawlReport, PageData, PageReport, SiteOverview, SiteSeoReport};
use anyhow::{Context, Result};
use colored::*;
use std::fs::File;
use std::io::Write;

/// How many ranked improvements the text report lists
const TOP_IMPROVEMENTS_SHOWN: usize = 10;

pub struct Reporter;

impl Reporter {
    /// Merges the site report with the page data it was computed from
    pub fn generate_report(
        start_url: &str,
        site: &SiteSeoReport,
        pages: &[PageData],
    ) -> CrawlReport {
        let timestamp = chrono::Utc::now().to_rfc3339();

        let pages = site
            .pages
            .iter()
            .map(|result| PageReport {
                url: result.url.clone(),
                score: result.score,
                improvements: result.improvements.clone(),
                details: pages.iter().find(|p| p.url == result.url).cloned(),
            })
            .collect();

        CrawlReport {
            start_url: start_url.to_string(),
            timestamp,
            site_overview: SiteOverview {
                overall_score: site.overall_score,
                total_pages: site.total_pages_analyzed,
                top_improvements: site.top_improvements.clone(),
            },
            pages,
        }
    }

    fn colored_score(score: u8) -> ColoredString {
        let text = format!("{}/100", score);
        if score >= 80 {
            text.bright_green()
        } else if score >= 50 {
            text.yellow()
        } else {
            text.bright_red()
        }
    }

    pub fn print_text_report(report: &CrawlReport) {
        println!("\n{}", "=".repeat(80).bright_blue());
        println!("{}", "Sitegrade - SEO Report".bright_cyan().bold());
        println!("{}", "=".repeat(80).bright_blue());
        println!();

        println!(
            "{}: {}",
            "Start URL".bright_white().bold(),
            report.start_url
        );
        println!(
            "{}: {}",
            "Timestamp".bright_white().bold(),
            report.timestamp
        );
        println!();

        // Summary
        println!("{}", "Summary".bright_yellow().bold().underline());
        println!(
            "  Overall Score:       {}",
            Self::colored_score(report.site_overview.overall_score).bold()
        );
        println!(
            "  Pages Analyzed:      {}",
            report.site_overview.total_pages.to_string().bright_green()
        );
        println!();

        if !report.site_overview.top_improvements.is_empty() {
            println!("{}", "Top Improvements".bright_yellow().bold().underline());
            for improvement in report
                .site_overview
                .top_improvements
                .iter()
                .take(TOP_IMPROVEMENTS_SHOWN)
            {
                let pages_label = if improvement.count == 1 { "page" } else { "pages" };
                println!(
                    "  {:>3} {}  {}",
                    improvement.count.to_string().bright_red(),
                    pages_label.dimmed(),
                    improvement.issue
                );
            }
            println!();
        }

        println!("{}", "Pages".bright_yellow().bold().underline());
        for page in &report.pages {
            println!();
            println!("  {} {}", "URL:".bright_white().bold(), page.url);
            println!("    Score:  {}", Self::colored_score(page.score));

            if let Some(details) = &page.details {
                let status = details.status_code;
                let status_str = if status < 300 {
                    status.to_string().bright_green()
                } else if status < 400 {
                    status.to_string().yellow()
                } else {
                    status.to_string().bright_red()
                };
                println!("    Status: {}", status_str);
                println!("    Load:   {} ms", details.load_time_ms);
                if !details.seo.title.is_empty() {
                    println!("    Title:  {}", details.seo.title.bright_white());
                }
            }

            if !page.improvements.is_empty() {
                println!("    Improvements:");
                for improvement in &page.improvements {
                    println!("      - {}", improvement);
                }
            }
        }

        println!();
        println!("{}", "=".repeat(80).bright_blue());
    }

    pub fn save_json_report(report: &CrawlReport, filename: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(filename)
            .with_context(|| format!("Failed to create report file: {}", filename))?;
        file.write_all(json.as_bytes())?;
        eprintln!("Report saved to: {}", filename.bright_green());
        Ok(())
    }
}
