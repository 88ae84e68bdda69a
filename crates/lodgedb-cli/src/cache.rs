//! `cache stats` and `cache clear`.

use clap::Subcommand;
use lodgedb_scraper::HtmlCache;

/// Sub-commands available under `cache`.
#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Show how many hotel pages are cached and their total size
    Stats,
    /// Delete every cached hotel page
    Clear,
}

pub(crate) fn run_cache(cache: &HtmlCache, command: &CacheCommands) -> anyhow::Result<()> {
    match command {
        CacheCommands::Stats => {
            let stats = cache.stats()?;
            println!(
                "{} cached pages, {:.2} MB in {}",
                stats.files,
                stats.megabytes(),
                cache.dir().display()
            );
        }
        CacheCommands::Clear => {
            let removed = cache.clear()?;
            println!("cleared {removed} cached pages from {}", cache.dir().display());
        }
    }
    Ok(())
}
