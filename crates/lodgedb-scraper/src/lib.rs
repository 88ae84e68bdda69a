pub mod browser;
pub mod cache;
pub mod error;
pub mod gallery;
pub mod hotel;
pub(crate) mod parse_helpers;
pub mod pipeline;
pub mod price;
pub mod rate_limit;
pub mod rooms;
pub mod search;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{BrowserOptions, BrowserSession};
pub use cache::{CacheStats, HtmlCache};
pub use error::ScraperError;
pub use gallery::{resolve_room_gallery, Gallery, GalleryFailure};
pub use hotel::{parse_hotel_page, ParsedHotel};
pub use pipeline::{scrape_hotel, HotelScrapeOptions};
pub use rate_limit::retry_with_backoff;
pub use search::{build_city_search_url, collect_city_entries, parse_search_results, CollectOptions};
pub use session::{ControlLocator, PageNavigator, PageSession, SearchPage};
