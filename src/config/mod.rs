//! clipkeep - Configuration module

mod settings;

pub use settings::{default_data_dir, Config, DEFAULT_MAX_ITEMS, DEFAULT_POLL_INTERVAL_MS};
