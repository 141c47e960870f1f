//! clipkeep - Configuration
//!
//! Runtime configuration for the history store and capture loop.
//! The config is built once by the embedding application and passed to the
//! components that need it; there is no process-wide settings state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default capacity bound for non-favorite history entries
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Default clipboard poll cadence in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Capture and retention configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of non-favorite entries kept; favorites are exempt
    /// and may accumulate without bound
    pub max_items: usize,
    /// Clipboard poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Directory holding the history database; created on first open
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            data_dir: default_data_dir(),
        }
    }
}

/// Per-user application data directory
///
/// Falls back to the current directory when the platform reports no data
/// directory, so a misconfigured environment degrades instead of failing.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("clipkeep"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = Config::default();
        assert_eq!(config.max_items, 100);
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn data_dir_ends_with_app_name_when_available() {
        if dirs::data_dir().is_some() {
            assert!(default_data_dir().ends_with("clipkeep"));
        }
    }
}
