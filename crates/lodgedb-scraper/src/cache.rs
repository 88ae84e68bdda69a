//! On-disk cache of hotel page HTML, keyed by the hotel slug.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::ScraperError;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-]").expect("valid filename regex"));

const CACHE_EXTENSION: &str = "html";

/// File count and size of the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub files: usize,
    pub bytes: u64,
}

impl CacheStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone)]
pub struct HtmlCache {
    dir: PathBuf,
}

impl HtmlCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `https://www.booking.com/hotel/ae/marina-view.html` maps to
    /// `<dir>/marina-view.html`; URLs without a usable last path segment
    /// fall back to the SHA-256 of the URL.
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        let name = hotel_slug(url).unwrap_or_else(|| format!("{:x}", Sha256::digest(url.as_bytes())));
        self.dir.join(format!("{name}.{CACHE_EXTENSION}"))
    }

    /// Returns `Ok(None)` when nothing is cached for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Cache`] if the file exists but cannot be read.
    pub fn load(&self, url: &str) -> Result<Option<String>, ScraperError> {
        let path = self.path_for(url);
        match std::fs::read_to_string(&path) {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(cache_error(&path, source)),
        }
    }

    /// Writes `html` for `url`, creating the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Cache`] on any filesystem failure.
    pub fn store(&self, url: &str, html: &str) -> Result<PathBuf, ScraperError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| cache_error(&self.dir, e))?;
        let path = self.path_for(url);
        std::fs::write(&path, html).map_err(|e| cache_error(&path, e))?;
        tracing::debug!(path = %path.display(), "cached hotel html");
        Ok(path)
    }

    /// Counts cached pages. A missing directory is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Cache`] if the directory cannot be listed.
    pub fn stats(&self) -> Result<CacheStats, ScraperError> {
        let mut stats = CacheStats::default();
        for path in self.cached_files()? {
            let metadata = std::fs::metadata(&path).map_err(|e| cache_error(&path, e))?;
            stats.files += 1;
            stats.bytes += metadata.len();
        }
        Ok(stats)
    }

    /// Deletes every cached page and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Cache`] on the first file that cannot be
    /// removed.
    pub fn clear(&self) -> Result<usize, ScraperError> {
        let files = self.cached_files()?;
        for path in &files {
            std::fs::remove_file(path).map_err(|e| cache_error(path, e))?;
        }
        Ok(files.len())
    }

    fn cached_files(&self) -> Result<Vec<PathBuf>, ScraperError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(cache_error(&self.dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| cache_error(&self.dir, e))?.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(CACHE_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Last path segment without its `.html`/`.htm` suffix, with anything but
/// word characters and hyphens replaced by `_`.
fn hotel_slug(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    let stem = last
        .strip_suffix(".html")
        .or_else(|| last.strip_suffix(".htm"))
        .unwrap_or(last);
    if stem.is_empty() {
        return None;
    }
    Some(UNSAFE_FILENAME_CHARS.replace_all(stem, "_").into_owned())
}

fn cache_error(path: &Path, source: std::io::Error) -> ScraperError {
    ScraperError::Cache {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_hotel_slug() {
        let cache = HtmlCache::new("/tmp/lodgedb-cache");
        assert_eq!(
            cache.path_for("https://www.booking.com/hotel/ae/marina-view.html"),
            PathBuf::from("/tmp/lodgedb-cache/marina-view.html")
        );
        assert_eq!(
            cache.path_for("https://www.booking.com/hotel/ae/al+bustan.en-gb.htm"),
            PathBuf::from("/tmp/lodgedb-cache/al_bustan_en-gb.html")
        );
    }

    #[test]
    fn path_falls_back_to_digest() {
        let cache = HtmlCache::new("cache");
        let path = cache.path_for("not a url");
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap();
        assert_eq!(name.len(), 64);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(path, cache.path_for("not a url"));
    }

    #[test]
    fn store_load_stats_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HtmlCache::new(dir.path().join("html"));
        let url = "https://www.booking.com/hotel/ae/palm.html";

        assert_eq!(cache.load(url).unwrap(), None);
        assert_eq!(cache.stats().unwrap(), CacheStats::default());

        cache.store(url, "<html>palm</html>").unwrap();
        cache
            .store("https://www.booking.com/hotel/ae/creek.html", "<html></html>")
            .unwrap();
        std::fs::write(dir.path().join("html").join("notes.txt"), "ignored").unwrap();

        assert_eq!(cache.load(url).unwrap().as_deref(), Some("<html>palm</html>"));
        let stats = cache.stats().unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.bytes, 30);

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.load(url).unwrap(), None);
        assert!(dir.path().join("html").join("notes.txt").exists());
    }
}
