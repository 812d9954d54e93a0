//! SQLite-backed key-value store.
//!
//! Holds user preferences, onboarding answers and work-time statistics in a
//! single `kv` table at `~/.config/lazycat/lazycat.db`.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::kv::KeyValueStore;
use super::migrations;
use crate::error::StoreError;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/lazycat/lazycat.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened,
    /// or migration fails.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Open {
            path: "~/.config/lazycat".into(),
            message: e.to_string(),
        })?;
        Self::open_at(dir.join("lazycat.db"))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::with_connection(conn, path)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".into(),
            message: e.to_string(),
        })?;
        Self::with_connection(conn, Path::new(":memory:"))
    }

    fn with_connection(conn: Connection, path: &Path) -> Result<Self, StoreError> {
        migrations::migrate(&conn).map_err(|e| StoreError::Open {
            path: path.to_path_buf(),
            message: format!("migration failed: {e}"),
        })?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| StoreError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        // Dropping an uncommitted transaction rolls it back.
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let mut db = SqliteStore::open_memory().unwrap();
        assert!(db.get("test").unwrap().is_none());
        db.set("test", "hello").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "hello");
        db.set("test", "again").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn batch_writes_all_entries() {
        let mut db = SqliteStore::open_memory().unwrap();
        db.set_many(&[("a", "1".into()), ("b", "2".into())]).unwrap();
        assert!(db.has_key("a").unwrap());
        assert_eq!(db.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn failed_batch_leaves_nothing_behind() {
        let mut db = SqliteStore::open_memory().unwrap();
        db.set("a", "old").unwrap();
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_b BEFORE INSERT ON kv WHEN NEW.key = 'b'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = db.set_many(&[("a", "new".into()), ("b", "2".into())]);
        assert!(matches!(result, Err(StoreError::WriteFailed(_))));
        assert_eq!(db.get("a").unwrap().as_deref(), Some("old"));
        assert!(db.get("b").unwrap().is_none());
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lazycat.db");
        {
            let mut db = SqliteStore::open_at(&path).unwrap();
            db.set("workMinutes", "30").unwrap();
        }
        let db = SqliteStore::open_at(&path).unwrap();
        assert_eq!(db.get("workMinutes").unwrap().as_deref(), Some("30"));
    }
}
