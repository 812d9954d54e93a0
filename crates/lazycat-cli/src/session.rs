//! Opening the persisted state shared by every command.

use lazycat_core::{MemoryStore, SettingsStore, SqliteStore};

/// The on-disk settings store. Fails if the database cannot be opened.
pub fn open_settings() -> Result<SettingsStore, Box<dyn std::error::Error>> {
    Ok(SettingsStore::new(SqliteStore::open()?))
}

/// The on-disk settings store, or an in-memory one when the database is
/// unavailable. Used by the foreground loop, which must keep running.
pub fn open_settings_or_memory() -> SettingsStore {
    match SqliteStore::open() {
        Ok(store) => SettingsStore::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "database unavailable, settings will not be saved");
            SettingsStore::new(MemoryStore::new())
        }
    }
}
