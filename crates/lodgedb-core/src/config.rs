use crate::app_config::{AppConfig, RoomRetention};
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so the lookup only needs to answer for the
/// ones being overridden. Tests drive this with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(&or_default(var, default)).ok_or_else(|| {
            invalid(var, "expected one of true/false/1/0/yes/no".to_string())
        })
    };

    let log_level = or_default("LODGEDB_LOG_LEVEL", "info");
    let cities_path = PathBuf::from(or_default("LODGEDB_CITIES_PATH", "./config/cities.yaml"));
    let output_dir = PathBuf::from(or_default("LODGEDB_OUTPUT_DIR", "."));
    let cache_dir = PathBuf::from(or_default("LODGEDB_CACHE_DIR", "./html_cache"));
    let use_cache = parse_flag("LODGEDB_USE_CACHE", "true")?;
    let headless = parse_flag("LODGEDB_HEADLESS", "true")?;
    let user_agent = or_default("LODGEDB_USER_AGENT", DEFAULT_USER_AGENT);

    let currency = or_default("LODGEDB_CURRENCY", "USD");
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(invalid(
            "LODGEDB_CURRENCY",
            format!("'{currency}' is not a 3-letter uppercase currency code"),
        ));
    }

    let page_load_timeout_secs = parse_u64("LODGEDB_PAGE_LOAD_TIMEOUT_SECS", "10")?;
    let modal_timeout_ms = parse_u64("LODGEDB_MODAL_TIMEOUT_MS", "5000")?;
    let modal_settle_ms = parse_u64("LODGEDB_MODAL_SETTLE_MS", "800")?;
    let inter_hotel_delay_ms = parse_u64("LODGEDB_INTER_HOTEL_DELAY_MS", "300")?;
    let max_retries = parse_u32("LODGEDB_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("LODGEDB_RETRY_BACKOFF_BASE_SECS", "2")?;
    let room_retention =
        parse_room_retention(&or_default("LODGEDB_ROOM_RETENTION", "require-gallery"))?;

    let batch_size = parse_usize("LODGEDB_BATCH_SIZE", "10")?;
    if batch_size == 0 {
        return Err(invalid("LODGEDB_BATCH_SIZE", "must be at least 1".to_string()));
    }

    Ok(AppConfig {
        log_level,
        cities_path,
        output_dir,
        cache_dir,
        use_cache,
        headless,
        user_agent,
        currency,
        page_load_timeout_secs,
        modal_timeout_ms,
        modal_settle_ms,
        inter_hotel_delay_ms,
        max_retries,
        retry_backoff_base_secs,
        room_retention,
        batch_size,
    })
}

fn parse_room_retention(s: &str) -> Result<RoomRetention, ConfigError> {
    match s {
        "require-gallery" => Ok(RoomRetention::RequireGallery),
        "attach-empty" => Ok(RoomRetention::AttachEmpty),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LODGEDB_ROOM_RETENTION".to_string(),
            reason: format!("unknown retention policy '{other}'"),
        }),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
