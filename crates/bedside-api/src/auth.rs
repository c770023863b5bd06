//! API authentication via bearer tokens.
//!
//! Login exchanges an allowed username for a random bearer token held in
//! an in-process table with a fixed TTL. The `require_auth` middleware
//! resolves `Authorization: Bearer <token>` back to the username and
//! injects it as a request extension for the handlers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::Rng;

use bedside_core::config::AuthConfig;

use crate::state::AppState;

/// Verified username for the current request, injected by `require_auth`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub String);

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

struct TokenEntry {
    username: String,
    expires_at: Instant,
}

/// In-process login table: username allow-list plus live tokens.
pub struct IdentityProvider {
    allowed_users: Vec<String>,
    token_ttl: Duration,
    tokens: Mutex<HashMap<String, TokenEntry>>,
}

impl IdentityProvider {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            allowed_users: config.allowed_users.clone(),
            token_ttl: Duration::from_secs(config.token_ttl_secs),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a token for an allowed username. Unknown usernames get
    /// nothing; there are no passwords in this demo scheme.
    pub fn login(&self, username: &str) -> Option<String> {
        if !self.allowed_users.iter().any(|u| u == username) {
            return None;
        }

        let token = generate_token();
        let mut tokens = self.tokens.lock().ok()?;
        let now = Instant::now();
        tokens.retain(|_, e| e.expires_at > now);
        tokens.insert(
            token.clone(),
            TokenEntry {
                username: username.to_string(),
                expires_at: now + self.token_ttl,
            },
        );
        Some(token)
    }

    /// Resolve a token to its username. Expired tokens are dropped and
    /// report as invalid.
    pub fn verify(&self, token: &str) -> Option<String> {
        let mut tokens = self.tokens.lock().ok()?;
        let now = Instant::now();
        match tokens.get(token) {
            Some(entry) if entry.expires_at > now => Some(entry.username.clone()),
            Some(_) => {
                tokens.remove(token);
                None
            }
            None => None,
        }
    }

    /// Drop a token (logout). A no-op for unknown tokens.
    pub fn revoke(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(token);
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

/// Middleware that validates Bearer token authentication.
///
/// Resolves the token through the `IdentityProvider` and injects the
/// verified username as an `AuthUser` extension. Returns 401 if the
/// header is missing, malformed, or the token is unknown or expired.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let auth_header = match req.headers().get("authorization") {
        Some(value) => value,
        None => return unauthorized("Missing Authorization header"),
    };

    let value_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(_) => return unauthorized("Invalid Authorization header encoding"),
    };

    let token = match value_str.strip_prefix("Bearer ") {
        Some(token) => token,
        None => return unauthorized("Invalid bearer token"),
    };

    match state.identities.verify(token) {
        Some(username) => {
            req.extensions_mut().insert(AuthUser(username));
            next.run(req).await
        }
        None => unauthorized("Invalid bearer token"),
    }
}
