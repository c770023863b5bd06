//! Database schema migrations.
//!
//! Applies the initial schema: the sessions table backing the SQLite
//! session store, the archives table for confirmed diagnoses, and the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use bedside_core::error::BedsideError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), BedsideError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| BedsideError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| BedsideError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), BedsideError> {
    conn.execute_batch(
        "
        -- Ephemeral tier (SQLite backend): one live session per identity.
        CREATE TABLE IF NOT EXISTS sessions (
            identity    TEXT PRIMARY KEY NOT NULL,
            payload     TEXT NOT NULL,
            expires_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_expires_at
            ON sessions (expires_at ASC);

        -- Durable tier: append-only archive of confirmed diagnoses.
        CREATE TABLE IF NOT EXISTS archives (
            id                   TEXT PRIMARY KEY NOT NULL,
            identity             TEXT NOT NULL,
            history              TEXT NOT NULL,
            diagnosis_confirmed  INTEGER NOT NULL DEFAULT 1,
            created_at           INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_archives_identity
            ON archives (identity, created_at DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| BedsideError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
