mod config;
pub mod database;
pub mod kv;
pub mod migrations;
pub mod settings;

pub use config::{AppConfig, AudioConfig, LogConfig, NotificationsConfig, TimerConfig};
pub use database::SqliteStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use settings::{DarkMode, Preferences, SettingsStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/lazycat[-dev]/` based on LAZYCAT_ENV.
///
/// Set LAZYCAT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LAZYCAT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lazycat-dev")
    } else {
        base_dir.join("lazycat")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
