use std::collections::HashSet;

use super::extract::ImageCandidate;
use super::normalize::{is_cdn_url, normalize_image_url};
use super::Gallery;

/// Merges candidates into a gallery: normalize, drop anything that is not
/// an `https` CDN URL, keep the first occurrence of each URL.
///
/// Output order is input order, so feeding extractor output in priority
/// order makes earlier sources win.
#[must_use]
pub fn merge_candidates<I>(candidates: I) -> Gallery
where
    I: IntoIterator<Item = ImageCandidate>,
{
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for candidate in candidates {
        let url = normalize_image_url(&candidate.url);
        if url.is_empty() || !is_cdn_url(&url) {
            tracing::trace!(raw = %candidate.url, source = ?candidate.source, "dropping image candidate");
            continue;
        }
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    Gallery::from_validated(urls)
}
