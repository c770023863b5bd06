//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its input via axum extractors, interacts with
//! AppState services, and returns JSON responses.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use bedside_core::types::{DiagnosticRecord, Turn};
use bedside_dialogue::TurnReply;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub is_new_session: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub history: Vec<Turn>,
    pub diagnosis_confirmed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - liveness check, no auth required.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /auth/login - exchange an allowed username for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }

    match state.identities.login(username) {
        Some(token) => {
            tracing::info!(username, "User logged in");
            Ok(Json(LoginResponse { token }))
        }
        None => Err(ApiError::Unauthorized(format!(
            "Unknown user: {}",
            username
        ))),
    }
}

/// POST /auth/logout - revoke the presented token.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<StatusResponse> {
    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.identities.revoke(token);
    }
    Json(StatusResponse {
        status: "logged_out".to_string(),
    })
}

/// GET /auth/me - the verified username behind the presented token.
pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user })
}

/// POST /turns - handle one doctor turn and return the patient's reply.
pub async fn handle_turn(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnReply>, ApiError> {
    let reply = state
        .orchestrator
        .handle_turn(&user, req.history, req.is_new_session)
        .await?;
    Ok(Json(reply))
}

/// GET /session - the caller's live session, 404 when absent.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<SessionResponse>, ApiError> {
    match state.orchestrator.resume(&user) {
        Some(session) => Ok(Json(SessionResponse {
            history: session.history,
            diagnosis_confirmed: session.diagnosis_confirmed,
        })),
        None => Err(ApiError::NotFound("No live session".to_string())),
    }
}

/// POST /session/reset - clear the caller's live session.
pub async fn reset_session(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.orchestrator.reset(&user)?;
    Ok(Json(StatusResponse {
        status: "reset".to_string(),
    }))
}

/// GET /archive - the caller's confirmed diagnoses, newest first.
pub async fn archive(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<DiagnosticRecord>>, ApiError> {
    Ok(Json(state.orchestrator.archived(&user)?))
}
