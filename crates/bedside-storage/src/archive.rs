//! Durable tier: append-only archive of confirmed diagnoses.
//!
//! Records are written exactly once, at the moment a diagnosis is
//! confirmed, and never mutated or deleted afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::debug;
use uuid::Uuid;

use bedside_core::error::BedsideError;
use bedside_core::types::{DiagnosticRecord, Turn};

use crate::db::Database;

/// Repository over the `archives` table.
#[derive(Debug, Clone)]
pub struct ArchiveRepository {
    db: Arc<Database>,
}

impl ArchiveRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a confirmed-diagnosis record.
    ///
    /// Append-only: every confirmation produces its own row, even when an
    /// identity confirms the same diagnosis in several sessions.
    pub fn archive(&self, record: &DiagnosticRecord) -> Result<(), BedsideError> {
        let history = serde_json::to_string(&record.history)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO archives (id, identity, history, diagnosis_confirmed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.to_string(),
                    record.identity,
                    history,
                    record.diagnosis_confirmed as i64,
                    record.created_at.timestamp(),
                ],
            )
            .map_err(|e| BedsideError::Storage(format!("Failed to archive record: {}", e)))?;
            Ok(())
        })?;

        debug!(
            identity = %record.identity,
            record_id = %record.id,
            "Archived confirmed diagnosis"
        );
        Ok(())
    }

    /// All archived records for an identity, newest first.
    pub fn list_by_identity(&self, identity: &str) -> Result<Vec<DiagnosticRecord>, BedsideError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, identity, history, diagnosis_confirmed, created_at
                     FROM archives
                     WHERE identity = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )
                .map_err(|e| BedsideError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(params![identity], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map_err(|e| BedsideError::Storage(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, identity, history, confirmed, created_at) =
                    row.map_err(|e| BedsideError::Storage(e.to_string()))?;
                records.push(row_to_record(&id, identity, &history, confirmed, created_at)?);
            }
            Ok(records)
        })
    }

    /// Total number of archived records (all identities).
    pub fn count(&self) -> Result<i64, BedsideError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM archives", [], |row| row.get(0))
                .map_err(|e| BedsideError::Storage(e.to_string()))
        })
    }
}

fn row_to_record(
    id: &str,
    identity: String,
    history: &str,
    confirmed: i64,
    created_at: i64,
) -> Result<DiagnosticRecord, BedsideError> {
    let id = Uuid::parse_str(id)
        .map_err(|e| BedsideError::Storage(format!("Invalid record id in archive: {}", e)))?;
    let history: Vec<Turn> = serde_json::from_str(history)?;
    let created_at = DateTime::<Utc>::from_timestamp(created_at, 0)
        .ok_or_else(|| BedsideError::Storage(format!("Invalid timestamp in archive: {}", created_at)))?;

    Ok(DiagnosticRecord {
        id,
        identity,
        history,
        diagnosis_confirmed: confirmed != 0,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedside_core::types::Session;

    fn repo() -> ArchiveRepository {
        ArchiveRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn confirmed_record(identity: &str, guess: &str) -> DiagnosticRecord {
        let mut session = Session::new(identity);
        session.history.push(Turn::doctor(guess));
        session.history.push(Turn::patient("Yes, that's correct!"));
        session.diagnosis_confirmed = true;
        DiagnosticRecord::from_session(&session)
    }

    #[test]
    fn test_archive_and_list_round_trip() {
        let repo = repo();
        let record = confirmed_record("doctor", "is it pneumonia?");
        repo.archive(&record).unwrap();

        let listed = repo.list_by_identity("doctor").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
        assert_eq!(listed[0].history, record.history);
        assert!(listed[0].diagnosis_confirmed);
    }

    #[test]
    fn test_list_is_newest_first() {
        let repo = repo();
        let mut first = confirmed_record("doctor", "is it the flu?");
        let mut second = confirmed_record("doctor", "is it pneumonia?");
        first.created_at = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
        second.created_at = DateTime::<Utc>::from_timestamp(2_000, 0).unwrap();

        repo.archive(&first).unwrap();
        repo.archive(&second).unwrap();

        let listed = repo.list_by_identity("doctor").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn test_list_is_scoped_to_identity() {
        let repo = repo();
        repo.archive(&confirmed_record("alice", "is it asthma?"))
            .unwrap();
        repo.archive(&confirmed_record("bob", "is it gout?")).unwrap();

        let listed = repo.list_by_identity("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identity, "alice");
    }

    #[test]
    fn test_list_empty_for_unknown_identity() {
        let repo = repo();
        assert!(repo.list_by_identity("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_repeat_confirmations_each_get_a_row() {
        let repo = repo();
        repo.archive(&confirmed_record("doctor", "is it the flu?"))
            .unwrap();
        repo.archive(&confirmed_record("doctor", "is it the flu?"))
            .unwrap();

        assert_eq!(repo.list_by_identity("doctor").unwrap().len(), 2);
        assert_eq!(repo.count().unwrap(), 2);
    }
}
