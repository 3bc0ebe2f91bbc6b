use crate::fetcher::RenderedPage;
use crate::models::{
    ContentStats, Headings, Image, LinkStats, MediaStats, PageData, SeoTags, SocialTags,
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Length of the body text sample kept per page, in characters
pub const TEXT_SAMPLE_CHARS: usize = 1000;

/// Value reported when a page carries no robots meta tag
pub const DEFAULT_ROBOTS: &str = "index, follow";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("selector {css:?} should be valid: {e}"))
}

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("title"));
static META_DESC_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("meta[name='description']"));
static CANONICAL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("link[rel='canonical']"));
static ROBOTS_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("meta[name='robots']"));
static VIEWPORT_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("meta[name='viewport']"));
static HTML_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("html"));
static FAVICON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("link[rel='icon'], link[rel='shortcut icon']"));
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h1"));
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h2"));
static H3_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h3"));
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("body"));
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("img"));
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static JSON_LD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("script[type='application/ld+json']"));

static OG_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:title']"));
static OG_DESC_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("meta[property='og:description']"));
static OG_IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:image']"));
static OG_URL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:url']"));
static TWITTER_CARD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("meta[name='twitter:card']"));
static TWITTER_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("meta[name='twitter:title']"));
static TWITTER_DESC_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("meta[name='twitter:description']"));
static TWITTER_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("meta[name='twitter:image']"));

/// Elements whose text never reaches the reader
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Builds the page record for a fetched page
pub fn extract_page(page: &RenderedPage, url: &Url) -> PageData {
    PageData {
        status_code: page.status_code,
        load_time_ms: page.load_time_ms,
        ..extract(&page.html, url)
    }
}

/// Parses rendered HTML into a page record.
///
/// Deterministic and offline. `status_code` and `load_time_ms` are left at zero;
/// use [`extract_page`] to carry them over from the fetch.
pub fn extract(html: &str, url: &Url) -> PageData {
    let document = Html::parse_document(html);

    let title = first_text(&document, &TITLE_SELECTOR).unwrap_or_default();
    let meta_description = attr(&document, &META_DESC_SELECTOR, "content").unwrap_or_default();

    let seo = SeoTags {
        title_length: title.chars().count(),
        description_length: meta_description.chars().count(),
        title,
        meta_description,
        canonical: attr(&document, &CANONICAL_SELECTOR, "href").unwrap_or_default(),
        robots: attr(&document, &ROBOTS_SELECTOR, "content")
            .unwrap_or_else(|| DEFAULT_ROBOTS.to_string()),
        viewport: attr(&document, &VIEWPORT_SELECTOR, "content"),
        lang: attr(&document, &HTML_SELECTOR, "lang"),
        favicon: attr(&document, &FAVICON_SELECTOR, "href"),
    };

    let (word_count, text_sample) = body_text_stats(&document);

    PageData {
        url: url.to_string(),
        status_code: 0,
        load_time_ms: 0,
        seo,
        social: extract_social(&document),
        schema: extract_json_ld(&document, url),
        structure: Headings {
            h1: all_texts(&document, &H1_SELECTOR),
            h2: all_texts(&document, &H2_SELECTOR),
            h3: all_texts(&document, &H3_SELECTOR),
        },
        content: ContentStats {
            word_count,
            text_sample,
        },
        media: extract_images(&document),
        links: extract_links(&document, url),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(element_text)
}

fn all_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document.select(selector).map(element_text).collect()
}

/// Attribute of the first matching element; an empty value counts as absent
fn attr(document: &Html, selector: &Selector, name: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(name))
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

fn extract_social(document: &Html) -> SocialTags {
    SocialTags {
        og_title: attr(document, &OG_TITLE_SELECTOR, "content"),
        og_description: attr(document, &OG_DESC_SELECTOR, "content"),
        og_image: attr(document, &OG_IMAGE_SELECTOR, "content"),
        og_url: attr(document, &OG_URL_SELECTOR, "content"),
        twitter_card: attr(document, &TWITTER_CARD_SELECTOR, "content"),
        twitter_title: attr(document, &TWITTER_TITLE_SELECTOR, "content"),
        twitter_description: attr(document, &TWITTER_DESC_SELECTOR, "content"),
        twitter_image: attr(document, &TWITTER_IMAGE_SELECTOR, "content"),
    }
}

/// Parses every JSON-LD block on its own; malformed blocks are dropped
fn extract_json_ld(document: &Html, url: &Url) -> Vec<serde_json::Value> {
    document
        .select(&JSON_LD_SELECTOR)
        .filter_map(|el| {
            let raw = el.text().collect::<String>();
            match serde_json::from_str(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Skipping malformed JSON-LD block");
                    None
                }
            }
        })
        .collect()
}

/// Normalized visible body text: word count and leading sample
fn body_text_stats(document: &Html) -> (usize, String) {
    let Some(body) = document.select(&BODY_SELECTOR).next() else {
        return (0, String::new());
    };

    let mut raw = String::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    let words: Vec<&str> = raw.split_whitespace().collect();
    let normalized = words.join(" ");
    let sample = normalized.chars().take(TEXT_SAMPLE_CHARS).collect();

    (words.len(), sample)
}

fn extract_images(document: &Html) -> MediaStats {
    let all_images: Vec<Image> = document
        .select(&IMG_SELECTOR)
        .map(|el| Image {
            src: el.value().attr("src").unwrap_or_default().to_string(),
            alt: el.value().attr("alt").map(|s| s.to_string()),
        })
        .collect();

    MediaStats {
        total_images: all_images.len(),
        images_without_alt: all_images.iter().filter(|img| img.alt.is_none()).count(),
        all_images,
    }
}

fn extract_links(document: &Html, url: &Url) -> LinkStats {
    let all_links: Vec<String> = document
        .select(&LINK_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.to_string())
        .collect();

    let hostname = url.host_str().unwrap_or_default();
    let mentions_host = |link: &str| !hostname.is_empty() && link.contains(hostname);

    let internal_links = all_links
        .iter()
        .filter(|link| link.starts_with('/') || mentions_host(link))
        .count();
    let external_links = all_links
        .iter()
        .filter(|link| link.starts_with("http") && !mentions_host(link))
        .count();

    LinkStats {
        total_links: all_links.len(),
        internal_links,
        external_links,
        all_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_extract_basic_tags() {
        let html = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>  Hello World  </title>
    <meta name="description" content="A short description">
    <link rel="canonical" href="https://example.com/blog/post">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <link rel="shortcut icon" href="/favicon.ico">
</head>
<body><h1>Main</h1></body>
</html>"#;

        let data = extract(html, &page_url());
        assert_eq!(data.url, "https://example.com/blog/post");
        assert_eq!(data.seo.title, "Hello World");
        assert_eq!(data.seo.title_length, 11);
        assert_eq!(data.seo.meta_description, "A short description");
        assert_eq!(data.seo.description_length, 19);
        assert_eq!(data.seo.canonical, "https://example.com/blog/post");
        assert_eq!(data.seo.robots, DEFAULT_ROBOTS);
        assert_eq!(
            data.seo.viewport.as_deref(),
            Some("width=device-width, initial-scale=1")
        );
        assert_eq!(data.seo.lang.as_deref(), Some("en"));
        assert_eq!(data.seo.favicon.as_deref(), Some("/favicon.ico"));
    }

    #[test]
    fn test_missing_tags_use_defaults() {
        let data = extract("<html><body><p>hi</p></body></html>", &page_url());
        assert_eq!(data.seo.title, "");
        assert_eq!(data.seo.meta_description, "");
        assert_eq!(data.seo.canonical, "");
        assert_eq!(data.seo.robots, "index, follow");
        assert!(data.seo.viewport.is_none());
        assert!(data.seo.lang.is_none());
        assert!(data.seo.favicon.is_none());
        assert_eq!(data.social, SocialTags::default());
        assert!(data.schema.is_empty());
    }

    #[test]
    fn test_headings_in_document_order() {
        let html = r#"<body>
<h2>Second level A</h2>
<h1> First </h1>
<h3>Third</h3>
<h2>Second level <em>B</em></h2>
<h1>Another</h1>
</body>"#;

        let data = extract(html, &page_url());
        assert_eq!(data.structure.h1, vec!["First", "Another"]);
        assert_eq!(data.structure.h2, vec!["Second level A", "Second level B"]);
        assert_eq!(data.structure.h3, vec!["Third"]);
    }

    #[test]
    fn test_body_text_normalization() {
        let html = "<body>\n  <p>one   two</p>\n\t<p>three</p>\n<script>var hidden = 1;</script><style>p{}</style></body>";
        let data = extract(html, &page_url());
        assert_eq!(data.content.text_sample, "one two three");
        assert_eq!(data.content.word_count, 3);
    }

    #[test]
    fn test_empty_body_has_no_words() {
        let data = extract("<html><body>   </body></html>", &page_url());
        assert_eq!(data.content.word_count, 0);
        assert_eq!(data.content.text_sample, "");
    }

    #[test]
    fn test_text_sample_is_capped() {
        let body = "word ".repeat(400);
        let html = format!("<body>{}</body>", body);
        let data = extract(&html, &page_url());
        assert_eq!(data.content.word_count, 400);
        assert_eq!(data.content.text_sample.chars().count(), TEXT_SAMPLE_CHARS);
    }

    #[test]
    fn test_images_alt_attribute_presence() {
        let html = r#"<body>
<img src="/a.png" alt="A">
<img src="b.png" alt="">
<img src="/c.png">
<img>
</body>"#;

        let data = extract(html, &page_url());
        assert_eq!(data.media.total_images, 4);
        assert_eq!(data.media.images_without_alt, 2);
        assert_eq!(
            data.media.all_images[1],
            Image {
                src: "b.png".to_string(),
                alt: Some(String::new())
            }
        );
        assert_eq!(data.media.all_images[3].src, "");
        assert!(data.media.images_without_alt <= data.media.total_images);
    }

    #[test]
    fn test_link_classification() {
        let html = r##"<body>
<a href="/about">About</a>
<a href="https://example.com/contact">Contact</a>
<a href="https://other.org/page">Other</a>
<a href="http://cdn.net/?ref=example.com">Tracked</a>
<a href="mailto:me@test.org">Mail</a>
<a href="#top">Top</a>
<a href="relative/page">Relative</a>
<a>No href</a>
</body>"##;

        let data = extract(html, &page_url());
        assert_eq!(data.links.total_links, 7);
        // "/about", the absolute same-host link and the tracked link mentioning the host
        assert_eq!(data.links.internal_links, 3);
        assert_eq!(data.links.external_links, 1);
        assert_eq!(data.links.all_links[5], "#top");
        assert!(data.links.internal_links + data.links.external_links <= data.links.total_links);
    }

    #[test]
    fn test_social_tags() {
        let html = r#"<head>
<meta property="og:title" content="OG Title">
<meta property="og:description" content="OG Desc">
<meta property="og:image" content="https://example.com/og.png">
<meta property="og:url" content="https://example.com/">
<meta name="twitter:card" content="summary">
<meta name="twitter:title" content="TW Title">
</head><body></body>"#;

        let data = extract(html, &page_url());
        assert_eq!(data.social.og_title.as_deref(), Some("OG Title"));
        assert_eq!(data.social.og_description.as_deref(), Some("OG Desc"));
        assert_eq!(
            data.social.og_image.as_deref(),
            Some("https://example.com/og.png")
        );
        assert_eq!(data.social.og_url.as_deref(), Some("https://example.com/"));
        assert_eq!(data.social.twitter_card.as_deref(), Some("summary"));
        assert_eq!(data.social.twitter_title.as_deref(), Some("TW Title"));
        assert!(data.social.twitter_description.is_none());
        assert!(data.social.twitter_image.is_none());
    }

    #[test]
    fn test_malformed_json_ld_is_skipped() {
        let html = r#"<head>
<script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
<script type="application/ld+json">{ not json </script>
<script type="application/ld+json">[{"@type": "WebSite"}]</script>
</head><body></body>"#;

        let data = extract(html, &page_url());
        assert_eq!(data.schema.len(), 2);
        assert_eq!(data.schema[0]["name"], "Acme");
        assert_eq!(data.schema[1][0]["@type"], "WebSite");
    }

    #[test]
    fn test_extract_page_carries_fetch_metadata() {
        let page = RenderedPage {
            html: "<title>Fetched page</title>".to_string(),
            status_code: 404,
            load_time_ms: 1234,
        };
        let data = extract_page(&page, &page_url());
        assert_eq!(data.status_code, 404);
        assert_eq!(data.load_time_ms, 1234);
        assert_eq!(data.seo.title, "Fetched page");
    }

    #[test]
    fn test_extract_is_deterministic() {
        let html = "<title>Same</title><body><a href='/x'>x</a></body>";
        assert_eq!(extract(html, &page_url()), extract(html, &page_url()));
    }
}
