mod cache;
mod output;
mod scrape;
mod verify_images;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lodgedb_scraper::HtmlCache;
use tracing_subscriber::EnvFilter;

use crate::cache::CacheCommands;
use crate::scrape::ScrapeArgs;

#[derive(Debug, Parser)]
#[command(name = "lodgedb-cli")]
#[command(about = "Hotel and room gallery scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect hotel links per city and scrape hotels with their room galleries
    Scrape {
        /// Override `search.max_hotels` from the cities file
        #[arg(long)]
        max_hotels: Option<usize>,

        /// Only scrape these cities (repeatable, case-insensitive)
        #[arg(long = "city")]
        cities: Vec<String>,

        /// Fetch every hotel page live, ignoring the HTML cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Inspect or clear the hotel page cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// HEAD-check every image URL in a JSON output file
    VerifyImages {
        /// JSON file written by `scrape`
        #[arg(long)]
        input: PathBuf,

        /// Maximum concurrent requests
        #[arg(long, default_value = "12")]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = lodgedb_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Scrape {
            max_hotels,
            cities,
            no_cache,
        }) => {
            scrape::run_scrape(
                &config,
                ScrapeArgs {
                    max_hotels,
                    cities,
                    no_cache,
                },
            )
            .await?;
        }
        Some(Commands::Cache { command }) => {
            cache::run_cache(&HtmlCache::new(&config.cache_dir), &command)?;
        }
        Some(Commands::VerifyImages { input, concurrency }) => {
            verify_images::run_verify_images(&input, concurrency, &config.user_agent).await?;
        }
        None => println!("lodgedb-cli ready; run with --help for commands"),
    }

    Ok(())
}
