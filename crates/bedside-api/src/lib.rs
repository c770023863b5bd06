//! Bedside API crate - the HTTP surface.
//!
//! Exposes the conversation engine over axum: bearer-token auth, turn
//! handling, session inspection and reset, and the diagnosis archive.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
