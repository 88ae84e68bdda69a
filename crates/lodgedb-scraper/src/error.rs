use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser protocol error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("invalid browser configuration: {0}")]
    BrowserConfig(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page {url} did not show any expected element within {timeout_secs}s")]
    PageLoadTimeout { url: String, timeout_secs: u64 },

    #[error("{action} failed: {reason}")]
    Interaction { action: &'static str, reason: String },

    #[error("cache I/O error for {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ScraperError {
    /// Returns `true` if the error is a transient browser or navigation
    /// condition worth retrying at the hotel level.
    ///
    /// Configuration, cache, and URL errors are never retried: a second
    /// attempt would fail the same way.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ScraperError::Browser(_)
                | ScraperError::Navigation { .. }
                | ScraperError::PageLoadTimeout { .. }
        )
    }
}
