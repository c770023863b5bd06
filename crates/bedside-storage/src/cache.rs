//! Ephemeral session tier.
//!
//! `SessionStore` is the key-value contract for live sessions: one entry
//! per identity, unconditional overwrite on write, TTL from last write.
//! Two implementations are provided and selected at process start: a
//! bounded in-process map and a SQLite-backed store that survives
//! restarts. A miss is always reported as absent, never synthesized.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use rusqlite::OptionalExtension;

use bedside_core::error::BedsideError;
use bedside_core::types::Session;

use crate::db::Database;

/// Key-value contract for the ephemeral session tier.
///
/// All mutable state is partitioned by identity key; concurrent writers
/// for the same identity race as last-write-wins with no reconciliation.
pub trait SessionStore: Send + Sync {
    /// Look up the live session for an identity. Expired entries count
    /// as absent.
    fn get(&self, identity: &str) -> Result<Option<Session>, BedsideError>;

    /// Unconditionally overwrite the entry for the session's identity,
    /// resetting its TTL.
    fn put(&self, session: &Session) -> Result<(), BedsideError>;

    /// Clear the entry for an identity (explicit reset). A no-op when
    /// absent.
    fn remove(&self, identity: &str) -> Result<(), BedsideError>;
}

// =============================================================================
// In-memory store
// =============================================================================

struct MemoryEntry {
    session: Session,
    expires_at: Instant,
}

/// Bounded in-process session store with lazy TTL eviction.
pub struct MemorySessionStore {
    ttl: Duration,
    max_sessions: usize,
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            ttl,
            max_sessions: max_sessions.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>, BedsideError> {
        self.entries
            .lock()
            .map_err(|e| BedsideError::Storage(format!("Session map lock poisoned: {}", e)))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, identity: &str) -> Result<Option<Session>, BedsideError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if let Some(entry) = entries.get(identity) {
            if entry.expires_at > now {
                return Ok(Some(entry.session.clone()));
            }
            entries.remove(identity);
        }
        Ok(None)
    }

    fn put(&self, session: &Session) -> Result<(), BedsideError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        entries.retain(|_, e| e.expires_at > now);

        // At capacity and inserting a new key: drop the entry closest to
        // expiry so the newest write always lands.
        if !entries.contains_key(&session.identity) && entries.len() >= self.max_sessions {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            session.identity.clone(),
            MemoryEntry {
                session: session.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    fn remove(&self, identity: &str) -> Result<(), BedsideError> {
        self.lock()?.remove(identity);
        Ok(())
    }
}

// =============================================================================
// SQLite-backed store
// =============================================================================

/// Session store on the shared SQLite database.
///
/// Process-external: live sessions survive a restart until their TTL
/// lapses. Expired rows are purged lazily on read.
pub struct SqliteSessionStore {
    db: Arc<Database>,
    ttl_secs: i64,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Database>, ttl: Duration) -> Self {
        Self {
            db,
            ttl_secs: ttl.as_secs() as i64,
        }
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, identity: &str) -> Result<Option<Session>, BedsideError> {
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            let row: Option<(String, i64)> = conn
                .query_row(
                    "SELECT payload, expires_at FROM sessions WHERE identity = ?1",
                    rusqlite::params![identity],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(|e| BedsideError::Storage(e.to_string()))?;

            match row {
                Some((_, expires_at)) if expires_at <= now => {
                    conn.execute(
                        "DELETE FROM sessions WHERE identity = ?1",
                        rusqlite::params![identity],
                    )
                    .map_err(|e| BedsideError::Storage(e.to_string()))?;
                    Ok(None)
                }
                Some((payload, _)) => {
                    let session: Session = serde_json::from_str(&payload)?;
                    Ok(Some(session))
                }
                None => Ok(None),
            }
        })
    }

    fn put(&self, session: &Session) -> Result<(), BedsideError> {
        let payload = serde_json::to_string(session)?;
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (identity, payload, expires_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(identity) DO UPDATE SET
                     payload = excluded.payload,
                     expires_at = excluded.expires_at,
                     updated_at = excluded.updated_at",
                rusqlite::params![session.identity, payload, now + self.ttl_secs, now],
            )
            .map_err(|e| BedsideError::Storage(format!("Failed to store session: {}", e)))?;
            Ok(())
        })
    }

    fn remove(&self, identity: &str) -> Result<(), BedsideError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE identity = ?1",
                rusqlite::params![identity],
            )
            .map_err(|e| BedsideError::Storage(format!("Failed to clear session: {}", e)))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedside_core::types::Turn;

    fn session_with(identity: &str, texts: &[&str]) -> Session {
        let mut s = Session::new(identity);
        for t in texts {
            s.history.push(Turn::doctor(*t));
        }
        s
    }

    // ---- MemorySessionStore ----

    #[test]
    fn test_memory_get_after_put_returns_same_session() {
        let store = MemorySessionStore::new(Duration::from_secs(3600), 100);
        let session = session_with("doctor", &["hello", "any fever?"]);
        store.put(&session).unwrap();
        assert_eq!(store.get("doctor").unwrap(), Some(session));
    }

    #[test]
    fn test_memory_miss_is_absent() {
        let store = MemorySessionStore::new(Duration::from_secs(3600), 100);
        assert_eq!(store.get("nobody").unwrap(), None);
    }

    #[test]
    fn test_memory_put_overwrites() {
        let store = MemorySessionStore::new(Duration::from_secs(3600), 100);
        store.put(&session_with("doctor", &["first"])).unwrap();
        let second = session_with("doctor", &["second"]);
        store.put(&second).unwrap();
        assert_eq!(store.get("doctor").unwrap(), Some(second));
    }

    #[test]
    fn test_memory_expired_entry_is_absent() {
        let store = MemorySessionStore::new(Duration::ZERO, 100);
        store.put(&session_with("doctor", &["hi"])).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.get("doctor").unwrap(), None);
    }

    #[test]
    fn test_memory_remove_clears_entry() {
        let store = MemorySessionStore::new(Duration::from_secs(3600), 100);
        store.put(&session_with("doctor", &["hi"])).unwrap();
        store.remove("doctor").unwrap();
        assert_eq!(store.get("doctor").unwrap(), None);
    }

    #[test]
    fn test_memory_remove_absent_is_ok() {
        let store = MemorySessionStore::new(Duration::from_secs(3600), 100);
        assert!(store.remove("nobody").is_ok());
    }

    #[test]
    fn test_memory_capacity_bound_holds() {
        let store = MemorySessionStore::new(Duration::from_secs(3600), 2);
        store.put(&session_with("a", &["1"])).unwrap();
        store.put(&session_with("b", &["2"])).unwrap();
        store.put(&session_with("c", &["3"])).unwrap();

        let live = ["a", "b", "c"]
            .iter()
            .filter(|id| store.get(id).unwrap().is_some())
            .count();
        assert_eq!(live, 2);
        // The newest write always lands.
        assert!(store.get("c").unwrap().is_some());
    }

    #[test]
    fn test_memory_separate_identities_do_not_collide() {
        let store = MemorySessionStore::new(Duration::from_secs(3600), 100);
        let a = session_with("alice", &["a"]);
        let b = session_with("bob", &["b"]);
        store.put(&a).unwrap();
        store.put(&b).unwrap();
        assert_eq!(store.get("alice").unwrap(), Some(a));
        assert_eq!(store.get("bob").unwrap(), Some(b));
    }

    // ---- SqliteSessionStore ----

    fn sqlite_store(ttl: Duration) -> SqliteSessionStore {
        SqliteSessionStore::new(Arc::new(Database::in_memory().unwrap()), ttl)
    }

    #[test]
    fn test_sqlite_get_after_put_returns_same_session() {
        let store = sqlite_store(Duration::from_secs(3600));
        let mut session = session_with("doctor", &["is it the flu?"]);
        session.history.push(Turn::patient("Maybe..."));
        store.put(&session).unwrap();
        assert_eq!(store.get("doctor").unwrap(), Some(session));
    }

    #[test]
    fn test_sqlite_miss_is_absent() {
        let store = sqlite_store(Duration::from_secs(3600));
        assert_eq!(store.get("nobody").unwrap(), None);
    }

    #[test]
    fn test_sqlite_put_overwrites() {
        let store = sqlite_store(Duration::from_secs(3600));
        store.put(&session_with("doctor", &["first"])).unwrap();
        let second = session_with("doctor", &["second"]);
        store.put(&second).unwrap();
        assert_eq!(store.get("doctor").unwrap(), Some(second));
    }

    #[test]
    fn test_sqlite_expired_entry_is_absent_and_purged() {
        let store = sqlite_store(Duration::ZERO);
        store.put(&session_with("doctor", &["hi"])).unwrap();
        // expires_at == now, so the entry is already past its TTL.
        assert_eq!(store.get("doctor").unwrap(), None);

        let count: i64 = store
            .db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
                    .map_err(|e| BedsideError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_sqlite_remove_clears_entry() {
        let store = sqlite_store(Duration::from_secs(3600));
        store.put(&session_with("doctor", &["hi"])).unwrap();
        store.remove("doctor").unwrap();
        assert_eq!(store.get("doctor").unwrap(), None);
    }

    #[test]
    fn test_stores_are_interchangeable_behind_trait() {
        let stores: Vec<Box<dyn SessionStore>> = vec![
            Box::new(MemorySessionStore::new(Duration::from_secs(60), 10)),
            Box::new(sqlite_store(Duration::from_secs(60))),
        ];
        for store in stores {
            let session = session_with("doctor", &["hello"]);
            store.put(&session).unwrap();
            assert_eq!(store.get("doctor").unwrap(), Some(session));
            store.remove("doctor").unwrap();
            assert_eq!(store.get("doctor").unwrap(), None);
        }
    }
}
