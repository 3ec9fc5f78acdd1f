//! Session endpoints.
//!
//! Wire format uses camelCase fields and a
//! `userExists` flag on login and validation responses.

use std::collections::HashSet;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a session.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Requested username.
    #[serde(default)]
    pub username: Option<String>,
}

/// Login outcome.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Whether the username was already taken.
    pub user_exists: bool,
    /// Issued token (only on success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Normalized username (only on success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Request to end a session.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Username whose session should end.
    #[serde(default)]
    pub username: Option<String>,
}

/// Logout outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Whether a stored session was removed.
    pub removed: bool,
}

/// Request to check a token.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// Claimed username.
    #[serde(default)]
    pub username: Option<String>,
    /// Presented token.
    #[serde(default)]
    pub token: Option<String>,
}

/// Validation outcome.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether the pair names a live session.
    pub user_exists: bool,
}

/// Request to prune sessions not in the active set.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// Usernames that are currently connected.
    #[serde(default)]
    pub active: Vec<String>,
}

/// Reconciliation outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    /// Sessions deleted from the store.
    pub removed: usize,
    /// Sessions whose removal failed.
    pub failed: usize,
    /// First failure, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Registry statistics.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Sessions currently cached.
    pub cache_size: usize,
    /// Cache capacity.
    pub cache_capacity: usize,
    /// Validations answered from the cache.
    pub cache_hits: u64,
    /// Validations answered by the store.
    pub store_hits: u64,
    /// Validations with no matching session.
    pub misses: u64,
    /// Validations that could not reach the store.
    pub store_errors: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /login - Create a session for a new username.
pub async fn login_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    let Json(request) = payload?;
    let username = request.username.unwrap_or_default();

    let outcome = state
        .with_registry(move |registry| registry.create_session(&username))
        .await?;

    match outcome {
        Ok(session) => Ok((
            StatusCode::CREATED,
            Json(LoginResponse {
                message: "User created successfully".to_string(),
                user_exists: false,
                token: Some(session.token),
                username: Some(session.username),
            }),
        )),
        Err(warden_session::Error::AlreadyExists(_)) => Ok((
            StatusCode::BAD_REQUEST,
            Json(LoginResponse {
                message: "Username already exists".to_string(),
                user_exists: true,
                token: None,
                username: None,
            }),
        )),
        Err(e) => Err(e.into()),
    }
}

/// POST /logout - End a session.
pub async fn logout_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<Json<LogoutResponse>> {
    let Json(request) = payload?;
    let username = request.username.unwrap_or_default();

    let removed = state
        .with_registry(move |registry| registry.remove_session(&username))
        .await??;

    Ok(Json(LogoutResponse {
        message: "User logged out successfully".to_string(),
        removed,
    }))
}

/// POST /validate-token - Check a username/token pair.
///
/// Responds 404 for anything that is not a live session, including when the
/// store is unreachable.
pub async fn validate_token_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ValidateResponse>)> {
    let Json(request) = payload?;
    let username = request.username.unwrap_or_default();
    let token = request.token.unwrap_or_default();

    let valid = state
        .with_registry(move |registry| registry.validate(&username, &token))
        .await?;

    let status = if valid {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    Ok((status, Json(ValidateResponse { user_exists: valid })))
}

/// POST /sessions/reconcile - Remove sessions not in the active set.
pub async fn reconcile_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Json<ReconcileResponse>> {
    let Json(request) = payload?;
    let active: HashSet<String> = request.active.into_iter().collect();

    let report = state
        .with_registry(move |registry| registry.reconcile(&active))
        .await??;

    Ok(Json(ReconcileResponse {
        removed: report.removed,
        failed: report.failed,
        error: report.first_error.map(|e| e.to_string()),
    }))
}

/// GET /sessions/stats - Cache occupancy and validation counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.registry.stats();

    Json(StatsResponse {
        cache_size: stats.cache.size,
        cache_capacity: stats.cache.capacity,
        cache_hits: stats.cache_hits,
        store_hits: stats.store_hits,
        misses: stats.misses,
        store_errors: stats.store_errors,
    })
}
