use crate::models::{ImprovementCount, PageData, PageSeoResult, SiteSeoReport};

const META_WEIGHT: f64 = 30.0;
const STRUCTURE_WEIGHT: f64 = 20.0;
const CONTENT_WEIGHT: f64 = 20.0;
const TECHNICAL_WEIGHT: f64 = 30.0;

const MAX_META_SCORE: f64 = 30.0;
const MAX_STRUCTURE_SCORE: f64 = 20.0;
const MAX_CONTENT_SCORE: f64 = 20.0;
const MAX_TECHNICAL_SCORE: f64 = 30.0;

/// Points for a meta tag that is present with a good length
const META_TAG_FULL: f64 = 15.0;
/// Points for a meta tag that is present but too short or too long
const META_TAG_PARTIAL: f64 = 8.0;

const TITLE_LENGTH: std::ops::RangeInclusive<usize> = 10..=60;
const DESCRIPTION_LENGTH: std::ops::RangeInclusive<usize> = 50..=160;
const MIN_WORD_COUNT: usize = 300;

pub struct SeoAnalyzer;

impl SeoAnalyzer {
    /// Scores one page out of 100 and lists what to improve, in the order the
    /// checks ran
    pub fn score_page(page: &PageData) -> PageSeoResult {
        let mut improvements = Vec::new();

        let meta = Self::meta_score(page, &mut improvements);
        let structure = Self::structure_score(page, &mut improvements);
        let content = Self::content_score(page, &mut improvements);
        let technical = Self::technical_score(page, &mut improvements);

        let total = meta / MAX_META_SCORE * META_WEIGHT
            + structure / MAX_STRUCTURE_SCORE * STRUCTURE_WEIGHT
            + content / MAX_CONTENT_SCORE * CONTENT_WEIGHT
            + technical / MAX_TECHNICAL_SCORE * TECHNICAL_WEIGHT;

        PageSeoResult {
            url: page.url.clone(),
            score: total.round().clamp(0.0, 100.0) as u8,
            improvements,
        }
    }

    /// Aggregates page scores into a site report. Returns `None` when there is
    /// nothing to analyze.
    pub fn score_site(pages: &[PageData]) -> Option<SiteSeoReport> {
        if pages.is_empty() {
            return None;
        }

        let results: Vec<PageSeoResult> = pages.iter().map(Self::score_page).collect();

        let total: u32 = results.iter().map(|r| u32::from(r.score)).sum();
        let overall_score = (f64::from(total) / results.len() as f64).round() as u8;

        Some(SiteSeoReport {
            overall_score,
            total_pages_analyzed: pages.len(),
            top_improvements: Self::rank_improvements(&results),
            pages: results,
        })
    }

    /// Counts every improvement across pages, most frequent first. Equal
    /// counts keep the order in which the issue was first seen.
    fn rank_improvements(results: &[PageSeoResult]) -> Vec<ImprovementCount> {
        let mut counts: Vec<ImprovementCount> = Vec::new();

        for issue in results.iter().flat_map(|r| r.improvements.iter()) {
            match counts.iter_mut().find(|c| &c.issue == issue) {
                Some(entry) => entry.count += 1,
                None => counts.push(ImprovementCount {
                    issue: issue.clone(),
                    count: 1,
                }),
            }
        }

        // sort_by is stable
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    fn meta_score(page: &PageData, improvements: &mut Vec<String>) -> f64 {
        let seo = &page.seo;
        let mut score = 0.0;

        if seo.title.is_empty() {
            improvements.push("Add a Title tag.".to_string());
        } else if TITLE_LENGTH.contains(&seo.title_length) {
            score += META_TAG_FULL;
        } else {
            score += META_TAG_PARTIAL;
            improvements.push("Title length should be between 10 and 60 characters.".to_string());
        }

        if seo.meta_description.is_empty() {
            improvements.push("Add a Meta Description.".to_string());
        } else if DESCRIPTION_LENGTH.contains(&seo.description_length) {
            score += META_TAG_FULL;
        } else {
            score += META_TAG_PARTIAL;
            improvements.push(
                "Meta description length should be between 50 and 160 characters.".to_string(),
            );
        }

        score
    }

    fn structure_score(page: &PageData, improvements: &mut Vec<String>) -> f64 {
        match page.structure.h1.len() {
            1 => 20.0,
            0 => {
                improvements.push("Add exactly one H1 tag.".to_string());
                0.0
            }
            _ => {
                improvements.push("Use only one H1 tag per page.".to_string());
                10.0
            }
        }
    }

    fn content_score(page: &PageData, improvements: &mut Vec<String>) -> f64 {
        let mut score = 0.0;

        if page.content.word_count > MIN_WORD_COUNT {
            score += 10.0;
        } else {
            improvements.push("Increase content word count (aim for >300 words).".to_string());
        }

        let total = page.media.total_images;
        let missing = page.media.images_without_alt.min(total);
        if total == 0 {
            score += 10.0;
        } else {
            score += 10.0 * (total - missing) as f64 / total as f64;
            if missing > 0 {
                improvements.push(format!("Add Alt text to {} images.", missing));
            }
        }

        score
    }

    fn technical_score(page: &PageData, improvements: &mut Vec<String>) -> f64 {
        let mut score = 0.0;

        if page.status_code == 200 {
            score += 10.0;
        } else {
            improvements.push(format!(
                "Fix page status code (currently {}).",
                page.status_code
            ));
        }

        if page.load_time_ms < 1000 {
            score += 5.0;
        } else if page.load_time_ms < 2500 {
            score += 3.0;
        } else {
            improvements.push("Improve page load speed (aim for <1s).".to_string());
        }

        if page.seo.canonical.is_empty() {
            improvements.push("Add a Canonical link.".to_string());
        } else {
            score += 5.0;
        }

        if has_value(&page.seo.viewport) {
            score += 5.0;
        } else {
            improvements.push("Add a Viewport meta tag for mobile responsiveness.".to_string());
        }

        if has_value(&page.social.og_title) || has_value(&page.social.twitter_title) {
            score += 5.0;
        } else {
            improvements.push("Add Open Graph or Twitter Card meta tags.".to_string());
        }

        score
    }
}

fn has_value(tag: &Option<String>) -> bool {
    tag.as_deref().is_some_and(|value| !value.is_empty())
}
