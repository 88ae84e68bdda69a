use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::modal::ModalSnapshot;
use super::normalize::{clean_entities, is_cdn_url, is_thumbnail_url, normalize_image_url};
use crate::parse_helpers::attr_chain;

static BACKGROUND_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:&quot;|["'])?(https://[^"')\s]+?)(?:&quot;|["'])?\s*\)"#)
        .expect("valid background-image regex")
});
static STYLED_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[style*='background-image']").expect("valid background selector")
});
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid img selector"));

/// Attributes that may carry an `<img>` source, lazy-loading variants last.
const IMG_SOURCE_ATTRS: [&str; 3] = ["src", "data-src", "data-lazy"];

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// Path fragments of site chrome (icons, spacers, sprites) served from the
/// same CDN as room photos.
const NON_CONTENT_MARKERS: [&str; 6] = [
    "/static/img/",
    "/xdata/images/xphoto/",
    "icon",
    "spacer",
    "sprite",
    "blank.gif",
];

/// Which markup source produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Carousel slides rendered as inline `background-image` styles.
    BackgroundImage,
    /// Thumbnail-strip `<img>` elements, upgraded to full resolution.
    Thumbnail,
    /// Any other `<img>` that looks like a content photo.
    GenericImage,
}

/// Extractors in merge priority order. Earlier sources win position ties.
pub const EXTRACTION_ORDER: [CandidateSource; 3] = [
    CandidateSource::BackgroundImage,
    CandidateSource::Thumbnail,
    CandidateSource::GenericImage,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub source: CandidateSource,
}

impl CandidateSource {
    /// Scans `snapshot` for this source's candidates. Each call parses the
    /// snapshot afresh.
    #[must_use]
    pub fn extract(self, snapshot: &ModalSnapshot) -> Vec<ImageCandidate> {
        let fragment = snapshot.parse();
        let urls = match self {
            CandidateSource::BackgroundImage => background_image_urls(&fragment),
            CandidateSource::Thumbnail => thumbnail_urls(&fragment),
            CandidateSource::GenericImage => generic_image_urls(&fragment),
        };
        urls.into_iter()
            .map(|url| ImageCandidate { url, source: self })
            .collect()
    }
}

/// Runs every extractor over `snapshot` in [`EXTRACTION_ORDER`] and
/// concatenates their output.
#[must_use]
pub fn collect_candidates(snapshot: &ModalSnapshot) -> Vec<ImageCandidate> {
    EXTRACTION_ORDER
        .iter()
        .flat_map(|source| source.extract(snapshot))
        .collect()
}

/// Pulls every `https` URL out of the `url(...)` tokens of a style value.
#[must_use]
pub fn background_urls_in_style(style: &str) -> Vec<String> {
    BACKGROUND_URL_RE
        .captures_iter(style)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_entities(m.as_str()))
        .filter(|url| !url.is_empty())
        .collect()
}

fn background_image_urls(fragment: &Html) -> Vec<String> {
    fragment
        .select(&STYLED_SELECTOR)
        .filter_map(|el| el.value().attr("style"))
        .flat_map(background_urls_in_style)
        .collect()
}

fn image_source(el: &ElementRef<'_>) -> Option<String> {
    attr_chain(el, &IMG_SOURCE_ATTRS)
}

/// Thumbnail-strip images. The strip container has no stable class, so a
/// thumbnail size segment in the image URL stands in for membership in it.
fn thumbnail_urls(fragment: &Html) -> Vec<String> {
    fragment
        .select(&IMG_SELECTOR)
        .filter_map(|el| image_source(&el))
        .filter(|src| is_thumbnail_url(src))
        .map(|src| normalize_image_url(&src))
        .collect()
}

fn generic_image_urls(fragment: &Html) -> Vec<String> {
    fragment
        .select(&IMG_SELECTOR)
        .filter_map(|el| image_source(&el))
        .filter(|src| !is_thumbnail_url(src))
        .map(|src| normalize_image_url(&src))
        .filter(|url| looks_like_content_image(url))
        .collect()
}

/// `true` for an `https` CDN URL with an image extension or an `/images/`
/// path that carries none of the [`NON_CONTENT_MARKERS`].
fn looks_like_content_image(url: &str) -> bool {
    if !is_cdn_url(url) {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    if NON_CONTENT_MARKERS.iter().any(|marker| path.contains(marker)) {
        return false;
    }
    path.contains("/images/") || IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
