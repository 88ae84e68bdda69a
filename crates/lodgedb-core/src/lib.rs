pub mod app_config;
pub mod cities;
pub mod config;
pub mod hotels;

pub use app_config::{AppConfig, RoomRetention};
pub use cities::{load_cities, CitiesFile, CityTarget, SearchConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use hotels::{AvailabilityOption, HotelRecord, PriceInfo, RoomRecord, SearchEntry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read cities file {path}: {source}")]
    CitiesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cities file: {0}")]
    CitiesFileParse(#[source] serde_yaml::Error),

    #[error("cities validation failed: {0}")]
    Validation(String),
}
