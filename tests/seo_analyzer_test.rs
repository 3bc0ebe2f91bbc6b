mod server;

use sitegrade::crawler::{CrawlOptions, crawl};
use sitegrade::fetcher::HttpFetcher;
use sitegrade::models::{
    ContentStats, Headings, Image, LinkStats, MediaStats, PageData, SeoTags, SocialTags,
};
use sitegrade::seo_analyzer::SeoAnalyzer;
use server::get_test_server_url;

/// A page that passes every check
fn good_page(url: &str) -> PageData {
    let title = "A well sized page title";
    let description = "A meta description that is long enough to fall inside the good range.";

    PageData {
        url: url.to_string(),
        status_code: 200,
        load_time_ms: 300,
        seo: SeoTags {
            title: title.to_string(),
            title_length: title.chars().count(),
            meta_description: description.to_string(),
            description_length: description.chars().count(),
            canonical: url.to_string(),
            robots: "index, follow".to_string(),
            viewport: Some("width=device-width, initial-scale=1".to_string()),
            lang: Some("en".to_string()),
            favicon: None,
        },
        social: SocialTags {
            og_title: Some("Open Graph title".to_string()),
            ..Default::default()
        },
        schema: vec![],
        structure: Headings {
            h1: vec!["Heading".to_string()],
            ..Default::default()
        },
        content: ContentStats {
            word_count: 500,
            text_sample: String::new(),
        },
        media: MediaStats::default(),
        links: LinkStats::default(),
    }
}

fn images(with_alt: usize, without_alt: usize) -> MediaStats {
    let mut all_images = Vec::new();
    for i in 0..with_alt {
        all_images.push(Image {
            src: format!("/img/{}.png", i),
            alt: Some("described".to_string()),
        });
    }
    for i in 0..without_alt {
        all_images.push(Image {
            src: format!("/img/missing-{}.png", i),
            alt: None,
        });
    }

    MediaStats {
        total_images: all_images.len(),
        images_without_alt: without_alt,
        all_images,
    }
}

#[test]
fn test_perfect_page_scores_100() {
    let result = SeoAnalyzer::score_page(&good_page("https://example.com/"));

    assert_eq!(result.score, 100);
    assert!(result.improvements.is_empty());
    assert_eq!(result.url, "https://example.com/");
}

#[test]
fn test_empty_page_stays_in_bounds() {
    let mut page = good_page("https://example.com/");
    page.status_code = 500;
    page.load_time_ms = 10_000;
    page.seo = SeoTags::default();
    page.social = SocialTags::default();
    page.structure = Headings::default();
    page.content = ContentStats::default();
    page.media = images(0, 4);

    let result = SeoAnalyzer::score_page(&page);

    assert_eq!(result.score, 0);
    assert_eq!(
        result.improvements,
        vec![
            "Add a Title tag.",
            "Add a Meta Description.",
            "Add exactly one H1 tag.",
            "Increase content word count (aim for >300 words).",
            "Add Alt text to 4 images.",
            "Fix page status code (currently 500).",
            "Improve page load speed (aim for <1s).",
            "Add a Canonical link.",
            "Add a Viewport meta tag for mobile responsiveness.",
            "Add Open Graph or Twitter Card meta tags.",
        ]
    );
}

#[test]
fn test_short_title_and_missing_description() {
    let mut page = good_page("https://example.com/");
    page.seo.title = "Hello".to_string();
    page.seo.title_length = 5;
    page.seo.meta_description = String::new();
    page.seo.description_length = 0;

    let result = SeoAnalyzer::score_page(&page);

    // Meta drops from 30 to 8
    assert_eq!(result.score, 78);
    assert_eq!(
        result.improvements,
        vec![
            "Title length should be between 10 and 60 characters.",
            "Add a Meta Description.",
        ]
    );
}

#[test]
fn test_long_description_is_partial_credit() {
    let mut page = good_page("https://example.com/");
    page.seo.meta_description = "x".repeat(200);
    page.seo.description_length = 200;

    let result = SeoAnalyzer::score_page(&page);

    assert_eq!(result.score, 93);
    assert_eq!(
        result.improvements,
        vec!["Meta description length should be between 50 and 160 characters."]
    );
}

#[test]
fn test_h1_count() {
    let page = good_page("https://example.com/");
    let result = SeoAnalyzer::score_page(&page);
    assert!(!result.improvements.iter().any(|i| i.contains("H1")));

    let mut page = good_page("https://example.com/");
    page.structure.h1 = vec!["One".to_string(), "Two".to_string()];
    let result = SeoAnalyzer::score_page(&page);
    assert_eq!(result.score, 90);
    assert_eq!(result.improvements, vec!["Use only one H1 tag per page."]);
}

#[test]
fn test_alt_text_ratio() {
    let mut page = good_page("https://example.com/");
    page.media = images(3, 1);

    let result = SeoAnalyzer::score_page(&page);

    // 7.5 of 10 image points
    assert_eq!(result.score, 98);
    assert_eq!(result.improvements, vec!["Add Alt text to 1 images."]);
}

#[test]
fn test_load_time_bands() {
    let mut page = good_page("https://example.com/");
    page.load_time_ms = 1500;
    let result = SeoAnalyzer::score_page(&page);
    assert_eq!(result.score, 98);
    assert!(result.improvements.is_empty());

    page.load_time_ms = 2500;
    let result = SeoAnalyzer::score_page(&page);
    assert_eq!(result.score, 95);
    assert_eq!(
        result.improvements,
        vec!["Improve page load speed (aim for <1s)."]
    );
}

#[test]
fn test_twitter_card_counts_as_social() {
    let mut page = good_page("https://example.com/");
    page.social = SocialTags {
        twitter_title: Some("Twitter title".to_string()),
        ..Default::default()
    };
    assert_eq!(SeoAnalyzer::score_page(&page).score, 100);

    page.social.twitter_title = Some(String::new());
    let result = SeoAnalyzer::score_page(&page);
    assert_eq!(result.score, 95);
    assert_eq!(
        result.improvements,
        vec!["Add Open Graph or Twitter Card meta tags."]
    );
}

#[test]
fn test_score_site_empty() {
    assert!(SeoAnalyzer::score_site(&[]).is_none());
}

#[test]
fn test_score_site_single_page() {
    let mut page = good_page("https://example.com/");
    page.seo.canonical = String::new();

    let report = SeoAnalyzer::score_site(std::slice::from_ref(&page)).expect("One page");

    assert_eq!(report.total_pages_analyzed, 1);
    assert_eq!(report.overall_score, report.pages[0].score);
    assert_eq!(report.overall_score, 95);
    assert_eq!(report.top_improvements.len(), 1);
    assert_eq!(report.top_improvements[0].issue, "Add a Canonical link.");
    assert_eq!(report.top_improvements[0].count, 1);
}

#[test]
fn test_top_improvements_ranked_by_count() {
    let mut a = good_page("https://example.com/a");
    a.seo.canonical = String::new();
    a.seo.viewport = None;

    let mut b = good_page("https://example.com/b");
    b.seo.canonical = String::new();

    let mut c = good_page("https://example.com/c");
    c.status_code = 404;

    let report = SeoAnalyzer::score_site(&[a, b, c]).expect("Three pages");

    assert_eq!(report.total_pages_analyzed, 3);
    let urls: Vec<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c"
        ]
    );

    let ranked: Vec<(&str, usize)> = report
        .top_improvements
        .iter()
        .map(|i| (i.issue.as_str(), i.count))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Add a Canonical link.", 2),
            ("Add a Viewport meta tag for mobile responsiveness.", 1),
            ("Fix page status code (currently 404).", 1),
        ]
    );

    // (90 + 95 + 90) / 3
    assert_eq!(report.overall_score, 92);
}

#[tokio::test]
async fn test_fixture_site_scores() {
    let base_url = get_test_server_url().await;
    let fetcher = HttpFetcher::new().expect("Failed to build HTTP fetcher");

    let pages = crawl(fetcher, &base_url, CrawlOptions::default())
        .await
        .expect("Crawl failed");
    let report = SeoAnalyzer::score_site(&pages).expect("Pages were crawled");

    for page in &report.pages {
        assert!(page.score <= 100);
    }

    let home = &report.pages[0];
    assert!(
        home.improvements.is_empty(),
        "home page should pass every check, got {:?}",
        home.improvements
    );

    let about = report
        .pages
        .iter()
        .find(|p| p.url.ends_with("/about.html"))
        .expect("about.html should be scored");
    assert!(
        about
            .improvements
            .contains(&"Meta description length should be between 50 and 160 characters.".to_string())
    );

    let contact = report
        .pages
        .iter()
        .find(|p| p.url.ends_with("/contact.html"))
        .expect("contact.html should be scored");
    assert!(
        contact
            .improvements
            .contains(&"Use only one H1 tag per page.".to_string())
    );
    assert!(!contact.improvements.iter().any(|i| i.starts_with("Add Alt text")));
}
