//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use bedside_core::config::BedsideConfig;
use bedside_dialogue::DialogueOrchestrator;

use crate::auth::IdentityProvider;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Mutex<BedsideConfig>>,
    /// The conversation engine.
    pub orchestrator: Arc<DialogueOrchestrator>,
    /// Login table for bearer-token auth.
    pub identities: Arc<IdentityProvider>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: BedsideConfig, orchestrator: DialogueOrchestrator) -> Self {
        let identities = IdentityProvider::new(&config.auth);
        Self {
            config: Arc::new(Mutex::new(config)),
            orchestrator: Arc::new(orchestrator),
            identities: Arc::new(identities),
            start_time: Instant::now(),
        }
    }
}
