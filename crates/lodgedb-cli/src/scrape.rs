//! The `scrape` command: collect hotel links per city, scrape hotels until
//! the target is met, and write results in batches.
//!
//! Per-city and per-hotel failures are logged and skipped rather than
//! propagated so a single bad page does not abort the run. The run fails
//! only when every hotel attempted failed.

use std::time::Duration;

use lodgedb_core::{AppConfig, CitiesFile, SearchEntry};
use lodgedb_scraper::{
    collect_city_entries, retry_with_backoff, scrape_hotel, BrowserOptions, BrowserSession,
    CollectOptions, HotelScrapeOptions, HtmlCache, PageNavigator, SearchPage,
};

use crate::output::OutputWriter;
use crate::verify_images::report_overlap;

pub(crate) struct ScrapeArgs {
    pub max_hotels: Option<usize>,
    pub cities: Vec<String>,
    pub no_cache: bool,
}

/// How many hotels to keep and how often to write them out.
pub(crate) struct RunSettings {
    pub target: usize,
    pub batch_size: usize,
    pub inter_hotel_delay: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub kept: usize,
    pub skipped_no_rooms: usize,
    pub failed: usize,
}

impl RunSummary {
    fn attempted(&self) -> usize {
        self.kept + self.skipped_no_rooms + self.failed
    }
}

pub(crate) async fn run_scrape(config: &AppConfig, args: ScrapeArgs) -> anyhow::Result<()> {
    let mut cities = lodgedb_core::load_cities(&config.cities_path)?;
    if let Some(max) = args.max_hotels {
        cities.search.max_hotels = max;
    }
    if !args.cities.is_empty() {
        cities
            .cities
            .retain(|c| args.cities.iter().any(|wanted| wanted.eq_ignore_ascii_case(&c.name)));
        if cities.cities.is_empty() {
            anyhow::bail!("none of {:?} is listed in {}", args.cities, config.cities_path.display());
        }
    }

    let cache = (config.use_cache && !args.no_cache).then(|| HtmlCache::new(&config.cache_dir));
    if let Some(cache) = &cache {
        let stats = cache.stats()?;
        tracing::info!(
            files = stats.files,
            size_mb = stats.megabytes(),
            dir = %cache.dir().display(),
            "html cache enabled"
        );
    }

    let browser_opts = BrowserOptions::from_config(config);
    let mut session = retry_with_backoff(config.max_retries, config.retry_backoff_base_secs, || {
        BrowserSession::launch(&browser_opts)
    })
    .await?;

    let result = scrape_with_session(&mut session, config, &cities, cache.as_ref()).await;
    session.close().await;
    result
}

async fn scrape_with_session(
    session: &mut BrowserSession,
    config: &AppConfig,
    cities: &CitiesFile,
    cache: Option<&HtmlCache>,
) -> anyhow::Result<()> {
    session.set_currency(&config.currency).await?;

    let entries = collect_entries(session, cities, &config.currency, &CollectOptions::default()).await;
    if entries.is_empty() {
        println!("no hotels found for the configured cities");
        return Ok(());
    }

    let settings = RunSettings {
        target: cities.search.max_hotels,
        batch_size: config.batch_size,
        inter_hotel_delay: Duration::from_millis(config.inter_hotel_delay_ms),
    };
    let mut output = OutputWriter::timestamped(&config.output_dir);
    let summary = process_hotels(
        session,
        &entries,
        cache,
        &HotelScrapeOptions::from_config(config),
        &settings,
        &mut output,
    )
    .await?;

    report_overlap(output.records());
    println!(
        "scraped {} hotels ({} without rooms, {} failed) -> {}",
        summary.kept,
        summary.skipped_no_rooms,
        summary.failed,
        output.json_path().display()
    );
    if summary.kept < settings.target {
        tracing::warn!(kept = summary.kept, target = settings.target, "hotel target not reached");
    }
    Ok(())
}

/// Collects links for every city in file order. A city that fails is
/// logged and skipped.
pub(crate) async fn collect_entries<S: SearchPage>(
    session: &mut S,
    cities: &CitiesFile,
    currency: &str,
    opts: &CollectOptions,
) -> Vec<SearchEntry> {
    let targets = cities.link_targets();
    let mut all = Vec::new();

    for (city, target) in cities.cities.iter().zip(targets) {
        match collect_city_entries(session, &cities.search, &city.name, currency, target, opts).await {
            Ok(entries) => {
                if entries.len() < target {
                    tracing::warn!(
                        city = %city.name,
                        found = entries.len(),
                        requested = target,
                        "fewer hotel links than requested"
                    );
                }
                all.extend(entries);
            }
            Err(e) => tracing::error!(city = %city.name, error = %e, "failed to collect hotel links"),
        }
    }
    all
}

/// Scrapes `entries` in order until `settings.target` hotels with rooms are
/// kept, flushing `output` every `batch_size` kept hotels and once more at
/// the end.
///
/// # Errors
///
/// Returns an error when writing output fails, or when every hotel
/// attempted failed.
pub(crate) async fn process_hotels<N: PageNavigator>(
    session: &mut N,
    entries: &[SearchEntry],
    cache: Option<&HtmlCache>,
    opts: &HotelScrapeOptions,
    settings: &RunSettings,
    output: &mut OutputWriter,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();
    let batch_size = settings.batch_size.max(1);
    let total = entries.len();

    for (index, entry) in entries.iter().enumerate() {
        if summary.kept >= settings.target {
            break;
        }
        if index > 0 && !settings.inter_hotel_delay.is_zero() {
            tokio::time::sleep(settings.inter_hotel_delay).await;
        }

        tracing::info!(
            position = index + 1,
            total,
            kept = summary.kept,
            target = settings.target,
            url = %entry.url,
            "scraping hotel"
        );

        match scrape_hotel(session, cache, entry, opts).await {
            Ok(hotel) if hotel.rooms.is_empty() => {
                tracing::warn!(url = %entry.url, "skipping hotel without rooms");
                summary.skipped_no_rooms += 1;
            }
            Ok(hotel) => {
                output.push(hotel);
                summary.kept += 1;
                if output.pending() >= batch_size {
                    output.flush()?;
                }
            }
            Err(e) => {
                tracing::error!(url = %entry.url, error = %e, "failed to scrape hotel");
                summary.failed += 1;
            }
        }
    }

    if output.pending() > 0 {
        output.flush()?;
    }

    if summary.attempted() > 0 && summary.failed == summary.attempted() {
        anyhow::bail!("all {} hotels failed to scrape", summary.failed);
    }
    Ok(summary)
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
