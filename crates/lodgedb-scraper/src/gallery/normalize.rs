//! Pure string transforms applied to every image URL before it can enter a
//! gallery.
//!
//! Room photos are served from the site's image CDN in several sizes that
//! differ only in one path segment, e.g.
//! `https://cf.bstatic.com/xdata/images/hotel/square60/481596992.jpg`. The
//! normalizer rewrites every known low-resolution segment to the single
//! high-resolution one, so the same photo discovered as a thumbnail and as a
//! carousel slide collapses to one URL.

/// Registrable domain of the image CDN (`cf.bstatic.com` and siblings).
pub const CDN_DOMAIN: &str = "bstatic.com";

/// Path segment of the full-resolution rendition.
pub const HIGH_RES_SEGMENT: &str = "/max1024x768/";

/// Thumbnail renditions observed in room modals.
pub const LOW_RES_SEGMENTS: [&str; 4] = ["/square60/", "/square200/", "/square300/", "/max300/"];

/// Origin used to make site-relative links absolute.
pub const SITE_ORIGIN: &str = "https://www.booking.com";

/// Removes HTML entities that leak into URLs lifted from inline `style`
/// attributes: `&quot;` is dropped and `&amp;` becomes `&`.
///
/// Repeats until nothing changes, so multiply escaped input such as
/// `&amp;amp;` is fully decoded in one call.
#[must_use]
pub fn clean_entities(url: &str) -> String {
    let mut current = url.to_string();
    loop {
        let next = current.replace("&amp;", "&").replace("&quot;", "");
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Replaces every low-resolution segment with [`HIGH_RES_SEGMENT`].
/// URLs without one are returned unchanged.
#[must_use]
pub fn upgrade_resolution(url: &str) -> String {
    LOW_RES_SEGMENTS
        .iter()
        .fold(url.to_string(), |acc, segment| acc.replace(segment, HIGH_RES_SEGMENT))
}

/// Returns `true` when `url` carries one of the thumbnail segments.
#[must_use]
pub fn is_thumbnail_url(url: &str) -> bool {
    LOW_RES_SEGMENTS.iter().any(|segment| url.contains(segment))
}

/// Full normalization: entity cleanup, scheme completion for
/// protocol-relative (`//host/...`) and root-relative (`/path`) sources,
/// then resolution upgrade.
///
/// Idempotent: `normalize_image_url(&normalize_image_url(u)) == normalize_image_url(u)`.
#[must_use]
pub fn normalize_image_url(raw: &str) -> String {
    let cleaned = clean_entities(raw.trim());
    let absolute = if cleaned.starts_with("//") {
        format!("https:{cleaned}")
    } else if cleaned.starts_with('/') {
        format!("{SITE_ORIGIN}{cleaned}")
    } else {
        cleaned
    };
    upgrade_resolution(&absolute)
}

/// Returns `true` for an `https` URL whose host is the image CDN.
#[must_use]
pub fn is_cdn_url(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    if parsed.scheme() != "https" {
        return false;
    }
    parsed
        .host_str()
        .is_some_and(|host| host == CDN_DOMAIN || host.ends_with(&format!(".{CDN_DOMAIN}")))
}
