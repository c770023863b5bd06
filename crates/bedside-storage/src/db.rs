//! Database connection management.
//!
//! One rusqlite Connection behind a Mutex, shared by the SQLite session
//! store and the archive. WAL mode plus a busy timeout so the two tiers
//! can write through the same handle without `SQLITE_BUSY` surprises.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use bedside_core::error::BedsideError;

use crate::migrations;

/// Milliseconds a writer waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Thread-safe SQLite database wrapper.
///
/// The connection is wrapped in a Mutex since rusqlite Connection is
/// not Sync; turn volume here is low enough that one serialized handle
/// is plenty.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn new(path: &Path) -> Result<Self, BedsideError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| BedsideError::Storage(format!("Failed to open database: {}", e)))?;
        let db = Self::prepare(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, BedsideError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BedsideError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::prepare(conn)
    }

    /// Apply pragmas and migrations to a freshly opened connection.
    fn prepare(conn: Connection) -> Result<Self, BedsideError> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {};
             PRAGMA foreign_keys = ON;",
            BUSY_TIMEOUT_MS
        ))
        .map_err(|e| BedsideError::Storage(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// This is the primary way to interact with the database. The mutex
    /// is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, BedsideError>
    where
        F: FnOnce(&Connection) -> Result<T, BedsideError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| BedsideError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM archives", [], |row| row.get(0))
                .map_err(|e| BedsideError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(&path).unwrap();

        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
                .map_err(|e| BedsideError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_wal_mode_enabled() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .map_err(|e| BedsideError::Storage(e.to_string()))?;
            // In-memory databases may report "memory" instead of "wal".
            assert!(
                mode == "wal" || mode == "memory",
                "Expected wal or memory, got: {}",
                mode
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_busy_timeout_configured() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let timeout: i64 = conn
                .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
                .map_err(|e| BedsideError::Storage(e.to_string()))?;
            assert_eq!(timeout, i64::from(BUSY_TIMEOUT_MS));
            Ok(())
        })
        .unwrap();
    }
}
