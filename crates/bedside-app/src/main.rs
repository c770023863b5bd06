//! Bedside application binary - composition root.
//!
//! Ties together all Bedside crates into a single executable:
//! 1. Load configuration from TOML (CLI > env > file > defaults)
//! 2. Open storage (WAL SQLite) and pick the session store backend
//! 3. Build the generation gateway and the dialogue orchestrator
//! 4. Start the axum REST API server

mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use bedside_api::start_server;
use bedside_api::state::AppState;
use bedside_core::config::BedsideConfig;
use bedside_dialogue::{DialogueOrchestrator, HttpGenerator};
use bedside_storage::{
    ArchiveRepository, Database, MemorySessionStore, SessionStore, SqliteSessionStore,
};

use cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, before tracing so the log level can come from the file.
    let config_file = args.resolve_config_path();
    let mut config = BedsideConfig::load_or_default(&config_file);

    config.general.port = args.resolve_port(config.general.port);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing: RUST_LOG wins, then the resolved log level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Bedside v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("bedside.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let ttl = Duration::from_secs(config.session.ttl_secs);
    let sessions: Arc<dyn SessionStore> = match config.session.backend.as_str() {
        "sqlite" => {
            tracing::info!("Session backend: sqlite");
            Arc::new(SqliteSessionStore::new(Arc::clone(&db), ttl))
        }
        "memory" => {
            tracing::info!("Session backend: memory");
            Arc::new(MemorySessionStore::new(ttl, config.session.max_sessions))
        }
        other => {
            tracing::warn!(backend = other, "Unknown session backend, using memory");
            Arc::new(MemorySessionStore::new(ttl, config.session.max_sessions))
        }
    };
    let archive = ArchiveRepository::new(Arc::clone(&db));

    // Generation gateway. The API key never lives in the config file.
    let api_key = std::env::var("BEDSIDE_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("BEDSIDE_API_KEY is not set; generation requests will be unauthenticated");
    }
    let generator = Arc::new(HttpGenerator::new(&config.generation, api_key)?);

    let orchestrator = DialogueOrchestrator::new(generator, sessions, archive);
    let state = AppState::new(config.clone(), orchestrator);

    // Serve until interrupted.
    if let Err(e) = start_server(&config, state).await {
        tracing::error!(error = %e, "Server failed — is another instance running?");
        return Err(e.into());
    }

    Ok(())
}
