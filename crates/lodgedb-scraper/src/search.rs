//! Search results: per-city query URLs, result-card parsing, and the
//! scroll/load-more loop that collects hotel links for one city.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use lodgedb_core::{PriceInfo, SearchConfig, SearchEntry};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::gallery::normalize::SITE_ORIGIN;
use crate::price::{extract_price_info, RATE_BLOCK_SELECTOR};
use crate::session::SearchPage;

pub const BASE_SEARCH_URL: &str = "https://www.booking.com/searchresults.html";

/// Hotel title links on result cards; the attribute spelling varies.
pub const TITLE_LINK_SELECTOR: &str = "a[data-testid='titleLink'], a[data-testid='title-link']";

static TITLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(TITLE_LINK_SELECTOR).expect("valid title link selector"));
static RATE_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(RATE_BLOCK_SELECTOR).expect("valid rate block selector"));

const PROPERTY_CARD_TESTID: &str = "property-card";

/// Builds the results URL for `city`. `offset` is omitted when zero.
#[must_use]
pub fn build_city_search_url(
    search: &SearchConfig,
    city: &str,
    currency: &str,
    offset: usize,
) -> String {
    let ss = format!("{city}, {}", search.country);
    let mut params: Vec<(&str, String)> = Vec::with_capacity(20);
    if let Some(aid) = search.affiliate_id.as_deref().filter(|a| !a.is_empty()) {
        params.push(("aid", aid.to_string()));
    }
    params.extend([
        ("lang", search.language.clone()),
        ("sb", "1".to_string()),
        ("src_elem", "sb".to_string()),
        ("ss", ss),
        ("ssne", city.to_string()),
        ("ssne_untouched", city.to_string()),
        ("efdco", "1".to_string()),
        ("checkin", search.checkin.format("%Y-%m-%d").to_string()),
        ("checkout", search.checkout.format("%Y-%m-%d").to_string()),
        ("group_adults", search.group_adults.to_string()),
        ("group_children", search.group_children.to_string()),
        ("no_rooms", search.no_rooms.to_string()),
        ("sb_travel_purpose", "leisure".to_string()),
        ("sb_lp", "1".to_string()),
        ("rows", search.page_size.to_string()),
        ("selected_currency", currency.to_string()),
    ]);
    if offset > 0 {
        params.push(("offset", offset.to_string()));
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{BASE_SEARCH_URL}?{query}")
}

/// Absolute hotel URL with the query string and fragment removed.
///
/// Returns `None` for hrefs that do not resolve against the site origin.
#[must_use]
pub fn clean_hotel_url(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let without_query = href.split(['?', '#']).next().unwrap_or_default();
    let base = url::Url::parse(SITE_ORIGIN).ok()?;
    let joined = base.join(without_query).ok()?;
    Some(joined.to_string())
}

/// Parses every hotel link on a results page, in page order and without
/// duplicates, pricing each from its enclosing property card.
#[must_use]
pub fn parse_search_results(html: &str, city: Option<&str>) -> Vec<SearchEntry> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for link in doc.select(&TITLE_LINK) {
        let Some(url) = link.value().attr("href").and_then(clean_hotel_url) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        entries.push(SearchEntry {
            url,
            search_city: city.map(str::to_string),
            search_pricing: card_pricing(&link),
        });
    }
    entries
}

fn card_pricing(link: &ElementRef<'_>) -> PriceInfo {
    let Some(card) = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().attr("data-testid") == Some(PROPERTY_CARD_TESTID))
    else {
        return PriceInfo::default();
    };
    let block = card.select(&RATE_BLOCK).next().unwrap_or(card);
    extract_price_info(&block)
}

/// Timing of the result collection loop.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// How long to wait for the first result card.
    pub results_timeout: Duration,
    /// Pause after scrolling so lazy content can load.
    pub scroll_pause: Duration,
    /// How long to wait for new cards after scrolling or clicking load-more.
    pub growth_timeout: Duration,
    pub poll_interval: Duration,
    /// Rounds without new cards before giving up on a city.
    pub max_idle_rounds: u32,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            results_timeout: Duration::from_secs(20),
            scroll_pause: Duration::from_secs(2),
            growth_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            max_idle_rounds: 3,
        }
    }
}

/// Collects up to `target` hotel entries for `city`.
///
/// Each round parses the cards currently rendered, then scrolls to the
/// bottom, clicks "load more results" if present, and waits for the card
/// count to grow. The loop ends at `target` entries or after
/// `max_idle_rounds` rounds in a row that added no cards.
///
/// # Errors
///
/// Returns navigation and browser errors from the session; an empty result
/// page is not an error.
pub async fn collect_city_entries<S: SearchPage>(
    session: &mut S,
    search: &SearchConfig,
    city: &str,
    currency: &str,
    target: usize,
    opts: &CollectOptions,
) -> Result<Vec<SearchEntry>, ScraperError> {
    let url = build_city_search_url(search, city, currency, 0);
    session.goto(&url).await?;
    if !session
        .wait_for_any(&[TITLE_LINK_SELECTOR], opts.results_timeout)
        .await?
    {
        tracing::warn!(city, "no result cards appeared before timeout");
    }

    let mut entries: Vec<SearchEntry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut idle_rounds = 0u32;

    while entries.len() < target && idle_rounds < opts.max_idle_rounds {
        let html = session.content().await?;
        let rendered = parse_search_results(&html, Some(city));
        let previous_total = session.count_matches(TITLE_LINK_SELECTOR).await?;

        for entry in rendered {
            if entries.len() >= target {
                break;
            }
            if seen.insert(entry.url.clone()) {
                entries.push(entry);
            }
        }
        if entries.len() >= target {
            break;
        }

        session.scroll_to_bottom().await?;
        tokio::time::sleep(opts.scroll_pause).await;
        let clicked = session.click_load_more().await?;

        if wait_for_growth(session, previous_total, opts).await? {
            idle_rounds = 0;
        } else {
            idle_rounds += 1;
            tracing::debug!(city, idle_rounds, clicked, "no new result cards");
        }
    }

    tracing::info!(city, collected = entries.len(), target, "collected hotel links");
    Ok(entries)
}

async fn wait_for_growth<S: SearchPage>(
    session: &mut S,
    previous_total: usize,
    opts: &CollectOptions,
) -> Result<bool, ScraperError> {
    let deadline = tokio::time::Instant::now() + opts.growth_timeout;
    loop {
        if session.count_matches(TITLE_LINK_SELECTOR).await? > previous_total {
            return Ok(true);
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(opts.poll_interval).await;
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
