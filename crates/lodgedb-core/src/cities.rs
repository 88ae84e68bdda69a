use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_language() -> String {
    "en-us".to_string()
}

fn default_adults() -> u8 {
    2
}

fn default_rooms() -> u8 {
    1
}

fn default_page_size() -> u32 {
    25
}

fn default_min_per_city() -> usize {
    10
}

fn default_buffer_multiplier() -> usize {
    2
}

fn default_max_hotels() -> usize {
    100
}

/// Search parameters shared by every city in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Country label appended to each city in the free-text query,
    /// e.g. `"United Arab Emirates (UAE)"`.
    pub country: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    #[serde(default = "default_adults")]
    pub group_adults: u8,
    #[serde(default)]
    pub group_children: u8,
    #[serde(default = "default_rooms")]
    pub no_rooms: u8,
    #[serde(default = "default_language")]
    pub language: String,
    /// Results requested per search page (`rows=`).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Affiliate id forwarded as `aid=`, when the site needs one.
    #[serde(default)]
    pub affiliate_id: Option<String>,
    /// Hotels to keep across all cities.
    #[serde(default = "default_max_hotels")]
    pub max_hotels: usize,
    /// Lower bound for the number of links collected per city.
    #[serde(default = "default_min_per_city")]
    pub min_per_city: usize,
    /// Links collected relative to `max_hotels`, since hotels without rooms
    /// are dropped later.
    #[serde(default = "default_buffer_multiplier")]
    pub buffer_multiplier: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityTarget {
    pub name: String,
    /// Overrides the computed per-city link target.
    #[serde(default)]
    pub target: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CitiesFile {
    pub search: SearchConfig,
    pub cities: Vec<CityTarget>,
}

impl CitiesFile {
    /// Number of hotel links to collect for each city, in file order.
    ///
    /// Every city gets at least `min_per_city`; the remainder of
    /// `max_hotels * buffer_multiplier` is dealt out one at a time starting
    /// from the first city. Explicit per-city targets win.
    #[must_use]
    pub fn link_targets(&self) -> Vec<usize> {
        let city_count = self.cities.len();
        if city_count == 0 {
            return Vec::new();
        }

        let total = self
            .search
            .max_hotels
            .saturating_mul(self.search.buffer_multiplier.max(1));
        let base = self.search.min_per_city;
        let mut targets = vec![base; city_count];

        let remainder = total.saturating_sub(base.saturating_mul(city_count));
        for i in 0..remainder {
            targets[i % city_count] += 1;
        }

        for (target, city) in targets.iter_mut().zip(&self.cities) {
            if let Some(explicit) = city.target {
                *target = explicit;
            }
        }
        targets
    }
}

/// Load and validate the city search configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_cities(path: &Path) -> Result<CitiesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CitiesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let cities_file: CitiesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CitiesFileParse)?;

    validate_cities(&cities_file)?;

    Ok(cities_file)
}

fn validate_cities(cities_file: &CitiesFile) -> Result<(), ConfigError> {
    let search = &cities_file.search;

    if search.checkout <= search.checkin {
        return Err(ConfigError::Validation(format!(
            "checkout {} must be after checkin {}",
            search.checkout, search.checkin
        )));
    }

    if search.page_size == 0 {
        return Err(ConfigError::Validation(
            "page_size must be at least 1".to_string(),
        ));
    }

    if search.no_rooms == 0 || search.group_adults == 0 {
        return Err(ConfigError::Validation(
            "a search needs at least one room and one adult".to_string(),
        ));
    }

    if cities_file.cities.is_empty() {
        return Err(ConfigError::Validation(
            "at least one city is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for city in &cities_file.cities {
        let trimmed = city.name.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(
                "city name must be non-empty".to_string(),
            ));
        }
        if !seen.insert(trimmed.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate city: '{}'",
                city.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "cities_test.rs"]
mod tests;
