use std::path::PathBuf;

/// What the room assembler does with a named room whose gallery came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomRetention {
    /// Keep a room only when it has both a name and at least one gallery image.
    #[default]
    RequireGallery,
    /// Keep every named room, attaching an empty gallery when none resolved.
    AttachEmpty,
}

impl std::fmt::Display for RoomRetention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomRetention::RequireGallery => write!(f, "require-gallery"),
            RoomRetention::AttachEmpty => write!(f, "attach-empty"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub cities_path: PathBuf,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
    pub headless: bool,
    pub user_agent: String,
    pub currency: String,
    pub page_load_timeout_secs: u64,
    pub modal_timeout_ms: u64,
    pub modal_settle_ms: u64,
    pub inter_hotel_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub room_retention: RoomRetention,
    pub batch_size: usize,
}
