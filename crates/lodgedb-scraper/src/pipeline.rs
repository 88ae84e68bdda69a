//! One hotel end to end: fetch the page (or take it from the cache), parse
//! it, resolve room galleries, and attach what the search card said.

use std::time::Duration;

use lodgedb_core::{AppConfig, HotelRecord, RoomRetention, SearchEntry};

use crate::cache::HtmlCache;
use crate::error::ScraperError;
use crate::gallery::ModalSettings;
use crate::hotel::{parse_hotel_page, ParsedHotel, HOTEL_READY_SELECTORS};
use crate::rate_limit::backoff_delay;
use crate::rooms::assemble_rooms;
use crate::session::PageNavigator;

#[derive(Debug, Clone)]
pub struct HotelScrapeOptions {
    pub page_load_timeout: Duration,
    pub modal: ModalSettings,
    pub retention: RoomRetention,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

impl HotelScrapeOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            modal: ModalSettings::from_config(config),
            retention: config.room_retention,
            max_retries: config.max_retries,
            retry_backoff_base_secs: config.retry_backoff_base_secs,
        }
    }
}

/// Scrapes the hotel behind `entry`.
///
/// A cached page is parsed without touching the session, so its rooms get
/// no galleries. A fetched page is stored in `cache` before parsing; cache
/// failures are logged and never fail the hotel.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] for unparseable URLs, and the last
/// navigation or browser error once fetch retries are exhausted.
pub async fn scrape_hotel<N: PageNavigator>(
    session: &mut N,
    cache: Option<&HtmlCache>,
    entry: &SearchEntry,
    opts: &HotelScrapeOptions,
) -> Result<HotelRecord, ScraperError> {
    let url = entry.url.as_str();
    url::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let cached = cache.and_then(|c| match c.load(url) {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(url, error = %e, "ignoring unreadable cache entry");
            None
        }
    });
    let from_cache = cached.is_some();

    let html = match cached {
        Some(html) => html,
        None => {
            let html = fetch_with_retry(session, url, opts).await?;
            if let Some(cache) = cache {
                if let Err(e) = cache.store(url, &html) {
                    tracing::warn!(url, error = %e, "failed to cache hotel html");
                }
            }
            html
        }
    };

    let ParsedHotel { mut record, rooms } = parse_hotel_page(url, &html);
    let live_session = (!from_cache).then_some(&mut *session);
    record.rooms = assemble_rooms(rooms, live_session, &opts.modal, opts.retention).await;
    record.search_city.clone_from(&entry.search_city);
    record.search_pricing = Some(entry.search_pricing.clone()).filter(|p| !p.is_empty());

    tracing::info!(
        url,
        from_cache,
        rooms = record.rooms.len(),
        room_images = record.room_image_count(),
        "scraped hotel"
    );
    Ok(record)
}

async fn fetch_with_retry<N: PageNavigator>(
    session: &mut N,
    url: &str,
    opts: &HotelScrapeOptions,
) -> Result<String, ScraperError> {
    let mut attempt = 0u32;
    loop {
        match fetch_page(session, url, opts.page_load_timeout).await {
            Ok(html) => return Ok(html),
            Err(e) if e.is_retriable() && attempt < opts.max_retries => {
                let delay = backoff_delay(opts.retry_backoff_base_secs, attempt);
                tracing::warn!(
                    url,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "hotel fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fetch_page<N: PageNavigator>(
    session: &mut N,
    url: &str,
    timeout: Duration,
) -> Result<String, ScraperError> {
    session.goto(url).await?;
    if !session.wait_for_any(&HOTEL_READY_SELECTORS, timeout).await? {
        tracing::warn!(url, "hotel page markers missing, reading page anyway");
    }
    session.content().await
}
