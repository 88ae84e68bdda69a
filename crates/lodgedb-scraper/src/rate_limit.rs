//! Retry utilities for hotel-level scraping.
//!
//! Provides exponential backoff retry logic for transient browser failures
//! such as navigation errors and page-load timeouts. Non-retriable errors
//! (cache I/O, invalid URLs, bad browser configuration) are propagated
//! immediately without retrying.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Sleep before retry number `attempt + 1`: `backoff_base_secs * 2^attempt`.
#[must_use]
pub fn backoff_delay(backoff_base_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(backoff_base_secs.saturating_mul(1u64 << attempt.min(62)))
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error (see [`ScraperError::is_retriable`]) the function
/// sleeps for `backoff_base_secs * 2^attempt` seconds and tries again, up to
/// `max_retries` additional attempts after the first try. If all retries are
/// exhausted the last error is returned.
///
/// # Backoff schedule (example with `backoff_base_secs = 2`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|--------------------------|
/// | 0 (initial) | none |
/// | 1 (first retry) | 2 × 2^0 = 2 s |
/// | 2 (second retry) | 2 × 2^1 = 4 s |
///
/// With `max_retries = 2` the operation is attempted at most 3 times total.
///
/// # Errors
///
/// Returns the first non-retriable error, or the last retriable error once
/// retries are exhausted.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let delay = backoff_delay(backoff_base_secs, attempt);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs = delay.as_secs(),
            error = %last_err,
            "transient scraper error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn navigation_failed() -> ScraperError {
        ScraperError::Navigation {
            url: "https://www.booking.com/hotel/ae/example.html".to_owned(),
            reason: "net::ERR_CONNECTION_RESET".to_owned(),
        }
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay(2, 0), Duration::from_secs(2));
        assert_eq!(backoff_delay(2, 1), Duration::from_secs(4));
        assert_eq!(backoff_delay(2, 3), Duration::from_secs(16));
        assert_eq!(backoff_delay(0, 5), Duration::ZERO);
        assert_eq!(backoff_delay(8, 200), Duration::from_secs(u64::MAX));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_navigation_error_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(navigation_failed())
                } else {
                    Ok::<u32, ScraperError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::PageLoadTimeout {
                    url: "https://www.booking.com/hotel/ae/example.html".to_owned(),
                    timeout_secs: 10,
                })
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::PageLoadTimeout { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_cache_error() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::Cache {
                    path: "html_cache/example.html".to_owned(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::Cache { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_invalid_url() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::InvalidUrl {
                    url: "not a url".to_owned(),
                    reason: "relative URL without a base".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::InvalidUrl { .. })));
    }
}
