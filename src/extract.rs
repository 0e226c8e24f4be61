//! Field extraction from detail and gallery pages
//!
//! The source site's markup is not under our control, so every field is
//! pulled out through [`PageExtractor`] and each lookup may come back empty.
//! [`RegexExtractor`] matches minimal text patterns against the raw page;
//! [`HtmlExtractor`] asks the same questions of a parsed document.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::config::ExtractorKind;

/// Marks tracking pixels on the image CDN that are never posters
const TRACKING_PIXEL_MARKER: &str = "//fls-";

pub trait PageExtractor {
    /// Text of the first `<title>` element, tags removed
    fn title_text(&self, html: &str) -> Option<String>;

    /// First `mediaviewer/...` link fragment, relative to the detail page
    fn gallery_fragment(&self, html: &str) -> Option<String>;

    /// `src` of every image element, in document order
    fn image_sources(&self, html: &str) -> Vec<String>;

    /// Title text and gallery fragment of one detail page
    fn detail_fields(&self, html: &str) -> (Option<String>, Option<String>) {
        (self.title_text(html), self.gallery_fragment(html))
    }
}

pub fn extractor_for(kind: ExtractorKind) -> Box<dyn PageExtractor> {
    match kind {
        ExtractorKind::Regex => Box::new(RegexExtractor),
        ExtractorKind::Html => Box::new(HtmlExtractor),
    }
}

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").unwrap());
static GALLERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(mediaviewer/.*?)""#).unwrap());
static IMG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img.*?/>").unwrap());
static SRC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"src=['"](.*?)['"]"#).unwrap());

#[derive(Debug, Default, Clone, Copy)]
pub struct RegexExtractor;

impl PageExtractor for RegexExtractor {
    fn title_text(&self, html: &str) -> Option<String> {
        TITLE_RE
            .captures(html)
            .map(|caps| caps[1].to_string())
    }

    fn gallery_fragment(&self, html: &str) -> Option<String> {
        GALLERY_RE
            .captures(html)
            .map(|caps| caps[1].to_string())
    }

    fn image_sources(&self, html: &str) -> Vec<String> {
        IMG_RE
            .find_iter(html)
            .filter_map(|tag| SRC_RE.captures(tag.as_str()))
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static GALLERY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[href*="mediaviewer/"]"#).unwrap());
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// Extraction over a parsed document
///
/// Each field method parses the page it is given. The resolver asks for
/// both detail fields through `detail_fields`, which parses once.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

fn title_in(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SEL)
        .next()
        .map(|title| title.text().collect())
}

fn gallery_in(document: &Html) -> Option<String> {
    document
        .select(&GALLERY_SEL)
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| href.find("mediaviewer/").map(|idx| href[idx..].to_string()))
}

impl PageExtractor for HtmlExtractor {
    fn title_text(&self, html: &str) -> Option<String> {
        title_in(&Html::parse_document(html))
    }

    fn gallery_fragment(&self, html: &str) -> Option<String> {
        gallery_in(&Html::parse_document(html))
    }

    fn image_sources(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&IMG_SEL)
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect()
    }

    fn detail_fields(&self, html: &str) -> (Option<String>, Option<String>) {
        let document = Html::parse_document(html);
        (title_in(&document), gallery_in(&document))
    }
}

/// Reduce a title element's text to a filesystem-safe grouping key
///
/// "Blade Runner (1982) - IMDb" becomes "BladeRunner": everything from the
/// first " (" on is dropped, then every non-alphanumeric character.
pub fn sanitize_title(raw: &str) -> String {
    let title = match raw.find(" (") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    title.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Keep an image URL unless it is a non-image tracking pixel
pub fn keep_image_url(url: &str) -> bool {
    url.contains(".jpg") || url.contains(".png") || !url.contains(TRACKING_PIXEL_MARKER)
}

/// Poster candidates on a gallery page, in discovery order
pub fn candidate_images(extractor: &dyn PageExtractor, html: &str) -> Vec<String> {
    extractor
        .image_sources(html)
        .into_iter()
        .filter(|url| keep_image_url(url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"<html><head><title>Blade Runner (1982) - IMDb</title></head>
<body><a class="poster" href="/title/tt0083658/mediaviewer/rm3423416320/?ref_=tt_ov_i">
<img alt="Poster" src="https://m.media-amazon.com/images/M/poster.jpg"/></a></body></html>"#;

    const GALLERY_PAGE: &str = r#"<div>
<img src="https://m.media-amazon.com/images/M/first.jpg" alt="one"/>
<img alt="tracker" src="https://fls-na.amazon.com/1/batch/1/OP/pixel"/>
<img src='https://m.media-amazon.com/images/M/second.png'/>
<img alt="no source"/>
<img src="https://example.test/spacer.gif"/>
</div>"#;

    #[test]
    fn test_sanitize_title_strips_year_and_symbols() {
        assert_eq!(sanitize_title("Blade Runner (1982) - IMDb"), "BladeRunner");
        assert_eq!(sanitize_title("Alien³ (1992)"), "Alien³");
        assert_eq!(sanitize_title("Dr. Strangelove: Or How (1964)"), "DrStrangeloveOrHow");
        assert_eq!(sanitize_title("Heat - IMDb"), "HeatIMDb");
    }

    #[test]
    fn test_sanitized_title_is_alphanumeric() {
        for raw in ["Mad Max: Fury Road (2015)", "8½ (1963)", "WALL·E (2008) - IMDb", " (2000)"] {
            assert!(sanitize_title(raw).chars().all(char::is_alphanumeric), "{}", raw);
        }
    }

    #[test]
    fn test_keep_image_url_three_way_condition() {
        assert!(keep_image_url("https://fls-na.amazon.com/pixel.jpg"));
        assert!(keep_image_url("https://fls-na.amazon.com/pixel.png"));
        assert!(keep_image_url("https://example.test/spacer.gif"));
        assert!(!keep_image_url("https://fls-na.amazon.com/1/batch/1/OP/pixel"));
    }

    #[test]
    fn test_keep_filter_is_idempotent() {
        let once = candidate_images(&RegexExtractor, GALLERY_PAGE);
        let twice: Vec<String> = once.iter().filter(|u| keep_image_url(u)).cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_regex_extractor_detail_fields() {
        let extractor = RegexExtractor;
        assert_eq!(
            extractor.title_text(DETAIL_PAGE).as_deref(),
            Some("Blade Runner (1982) - IMDb")
        );
        assert_eq!(
            extractor.gallery_fragment(DETAIL_PAGE).as_deref(),
            Some("mediaviewer/rm3423416320/?ref_=tt_ov_i")
        );
    }

    #[test]
    fn test_regex_extractor_takes_first_title() {
        let html = "<title>First (2001)</title><svg><title>Second</title></svg>";
        assert_eq!(RegexExtractor.title_text(html).as_deref(), Some("First (2001)"));
    }

    #[test]
    fn test_regex_extractor_missing_markup() {
        let extractor = RegexExtractor;
        assert_eq!(extractor.title_text("<html></html>"), None);
        assert_eq!(extractor.gallery_fragment("<html></html>"), None);
        assert!(extractor.image_sources("<html></html>").is_empty());
    }

    #[test]
    fn test_candidate_images_in_discovery_order() {
        assert_eq!(
            candidate_images(&RegexExtractor, GALLERY_PAGE),
            vec![
                "https://m.media-amazon.com/images/M/first.jpg",
                "https://m.media-amazon.com/images/M/second.png",
                "https://example.test/spacer.gif",
            ]
        );
    }

    #[test]
    fn test_html_extractor_agrees_with_regex_extractor() {
        let regex = RegexExtractor;
        let html = HtmlExtractor;
        assert_eq!(html.title_text(DETAIL_PAGE), regex.title_text(DETAIL_PAGE));
        assert_eq!(
            html.gallery_fragment(DETAIL_PAGE),
            regex.gallery_fragment(DETAIL_PAGE)
        );
        assert_eq!(
            candidate_images(&html, GALLERY_PAGE),
            candidate_images(&regex, GALLERY_PAGE)
        );
    }

    #[test]
    fn test_detail_fields_match_single_field_lookups() {
        for extractor in [extractor_for(ExtractorKind::Regex), extractor_for(ExtractorKind::Html)] {
            assert_eq!(
                extractor.detail_fields(DETAIL_PAGE),
                (
                    extractor.title_text(DETAIL_PAGE),
                    extractor.gallery_fragment(DETAIL_PAGE)
                )
            );
        }
        assert_eq!(HtmlExtractor.detail_fields("<html></html>"), (None, None));
    }

    #[test]
    fn test_html_extractor_finds_unclosed_img_tags() {
        let page = r#"<p><img src="https://example.test/a.jpg"></p>"#;
        assert_eq!(HtmlExtractor.image_sources(page), vec!["https://example.test/a.jpg"]);
        assert!(RegexExtractor.image_sources(page).is_empty());
    }
}
