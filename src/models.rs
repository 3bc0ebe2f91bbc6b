use serde::{Deserialize, Serialize};

/// Everything extracted from one fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub url: String,
    pub status_code: u16,
    pub load_time_ms: u64,
    pub seo: SeoTags,
    pub social: SocialTags,
    pub schema: Vec<serde_json::Value>,
    pub structure: Headings,
    pub content: ContentStats,
    pub media: MediaStats,
    pub links: LinkStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoTags {
    pub title: String,
    pub title_length: usize,
    pub meta_description: String,
    pub description_length: usize,
    pub canonical: String,
    pub robots: String,
    pub viewport: Option<String>,
    pub lang: Option<String>,
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialTags {
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub og_url: Option<String>,
    pub twitter_card: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub twitter_image: Option<String>,
}

/// Heading texts, each list in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStats {
    pub word_count: usize,
    pub text_sample: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStats {
    pub total_images: usize,
    pub images_without_alt: usize,
    pub all_images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub total_links: usize,
    pub internal_links: usize,
    pub external_links: usize,
    /// Raw `href` values exactly as they appear in the markup
    pub all_links: Vec<String>,
}

/// Score and improvement list for a single page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSeoResult {
    pub url: String,
    pub score: u8,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementCount {
    pub issue: String,
    pub count: usize,
}

/// Site-wide aggregation of page results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSeoReport {
    pub overall_score: u8,
    pub total_pages_analyzed: usize,
    pub top_improvements: Vec<ImprovementCount>,
    pub pages: Vec<PageSeoResult>,
}

/// Final report handed to the user: site overview plus every page result
/// merged with the data it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub start_url: String,
    pub timestamp: String,
    pub site_overview: SiteOverview,
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteOverview {
    pub overall_score: u8,
    pub total_pages: usize,
    pub top_improvements: Vec<ImprovementCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub score: u8,
    pub improvements: Vec<String>,
    pub details: Option<PageData>,
}
