//! Bedside storage crate - the tiered session store.
//!
//! Provides a WAL-mode SQLite database with migrations, the ephemeral
//! `SessionStore` contract with in-memory and SQLite-backed
//! implementations, and the append-only archive of confirmed diagnoses.

pub mod archive;
pub mod cache;
pub mod db;
pub mod migrations;

pub use archive::ArchiveRepository;
pub use cache::{MemorySessionStore, SessionStore, SqliteSessionStore};
pub use db::Database;
