//! SQLite-backed persistence.
//!
//! Two tables:
//! - `kv` carries the foreground timer snapshot between CLI invocations
//!   within one workout session; it is cleared on stop, so nothing survives
//!   past the session.
//! - `cache_entries` is the persistent [`CacheStore`] behind the asset
//!   cache worker.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use super::data_dir;
use crate::cache::{CachedAsset, CacheStore};
use crate::error::{CacheError, DatabaseError};

/// SQLite database at `~/.config/kaizenwalk/kaizenwalk.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database in the data directory, creating the file and
    /// schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|err| DatabaseError::OpenFailed {
            path: PathBuf::from("kaizenwalk.db"),
            message: err.to_string(),
        })?;
        Self::open_at(&dir.join("kaizenwalk.db"))
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|err| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|err| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            message: err.to_string(),
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS cache_entries (
                    cache_name TEXT NOT NULL,
                    url        TEXT NOT NULL,
                    body       BLOB NOT NULL,
                    PRIMARY KEY (cache_name, url)
                );

                CREATE INDEX IF NOT EXISTS idx_cache_entries_cache_name
                    ON cache_entries(cache_name);",
            )
            .map_err(|err| DatabaseError::MigrationFailed(err.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store. Returns whether it existed.
    pub fn kv_delete(&self, key: &str) -> Result<bool, rusqlite::Error> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

impl CacheStore for Database {
    fn get(&self, cache_name: &str, url: &str) -> Result<Option<CachedAsset>, CacheError> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM cache_entries WHERE cache_name = ?1 AND url = ?2")
            .map_err(store_error)?;
        let result = stmt.query_row(params![cache_name, url], |row| row.get::<_, Vec<u8>>(0));
        match result {
            Ok(bytes) => Ok(Some(CachedAsset {
                url: url.to_string(),
                bytes,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(store_error(e)),
        }
    }

    fn put(&mut self, cache_name: &str, url: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO cache_entries (cache_name, url, body)
                 VALUES (?1, ?2, ?3)",
                params![cache_name, url, bytes],
            )
            .map_err(store_error)?;
        Ok(())
    }

    fn delete(&mut self, cache_name: &str, url: &str) -> Result<bool, CacheError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM cache_entries WHERE cache_name = ?1 AND url = ?2",
                params![cache_name, url],
            )
            .map_err(store_error)?;
        Ok(removed > 0)
    }

    fn delete_cache(&mut self, cache_name: &str) -> Result<bool, CacheError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM cache_entries WHERE cache_name = ?1",
                params![cache_name],
            )
            .map_err(store_error)?;
        Ok(removed > 0)
    }

    fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT cache_name FROM cache_entries ORDER BY cache_name")
            .map_err(store_error)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;
        Ok(names)
    }
}

fn store_error(err: rusqlite::Error) -> CacheError {
    CacheError::Store(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_round_trip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("timer_snapshot").unwrap().is_none());
        db.kv_set("timer_snapshot", "{\"isRunning\":true}").unwrap();
        assert_eq!(
            db.kv_get("timer_snapshot").unwrap().unwrap(),
            "{\"isRunning\":true}"
        );
        assert!(db.kv_delete("timer_snapshot").unwrap());
        assert!(!db.kv_delete("timer_snapshot").unwrap());
        assert!(db.kv_get("timer_snapshot").unwrap().is_none());
    }

    #[test]
    fn cache_store_round_trip() {
        let mut db = Database::open_memory().unwrap();
        db.put("shell", "/app.js", b"console.log(1)").unwrap();
        db.put("audio", "/track.mp3", b"bytes").unwrap();

        let asset = db.get("shell", "/app.js").unwrap().unwrap();
        assert_eq!(asset.bytes, b"console.log(1)");
        assert!(asset.is_valid());
        assert_eq!(db.cache_names().unwrap(), vec!["audio", "shell"]);

        assert!(db.delete("shell", "/app.js").unwrap());
        assert!(!db.delete("shell", "/app.js").unwrap());
        assert!(db.get("shell", "/app.js").unwrap().is_none());
    }

    #[test]
    fn delete_cache_drops_every_entry() {
        let mut db = Database::open_memory().unwrap();
        db.put("kaizenwalk-mp3-v0", "/a", b"a").unwrap();
        db.put("kaizenwalk-mp3-v0", "/b", b"b").unwrap();
        db.put("kaizenwalk-mp3-v1", "/a", b"a").unwrap();

        assert!(db.delete_cache("kaizenwalk-mp3-v0").unwrap());
        assert!(!db.delete_cache("kaizenwalk-mp3-v0").unwrap());
        assert_eq!(db.cache_names().unwrap(), vec!["kaizenwalk-mp3-v1"]);
    }

    #[test]
    fn empty_body_survives_and_reads_invalid() {
        let mut db = Database::open_memory().unwrap();
        db.put("audio", "/track.mp3", b"").unwrap();
        let asset = db.get("audio", "/track.mp3").unwrap().unwrap();
        assert!(!asset.is_valid());
    }

    #[test]
    fn reopen_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaizenwalk.db");
        {
            let mut db = Database::open_at(&path).unwrap();
            db.put("audio", "/track.mp3", b"track bytes").unwrap();
            db.kv_set("timer_snapshot", "{}").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        let asset = db.get("audio", "/track.mp3").unwrap().unwrap();
        assert_eq!(asset.bytes, b"track bytes");
        assert_eq!(db.kv_get("timer_snapshot").unwrap().unwrap(), "{}");
    }
}
