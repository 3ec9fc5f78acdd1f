//! Liveness endpoint backed by a store probe.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

/// Cache occupancy as reported by `/health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheHealth {
    /// Sessions currently cached.
    pub size: usize,
    /// Cache capacity.
    pub capacity: usize,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` when the store answered, `degraded` otherwise.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Stored session count; absent when the store could not be reached.
    pub sessions: Option<usize>,
    /// Recency cache occupancy.
    pub cache: CacheHealth,
}

/// GET /health - 200 when the store answers a count, 503 when it does not.
///
/// Cached sessions keep validating during a store outage, so the cache
/// figures are reported either way.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let counted = state
        .with_registry(|registry| registry.session_count())
        .await;

    let sessions = match counted {
        Ok(Ok(count)) => Some(count),
        Ok(Err(e)) => {
            warn!(error = %e, "Health probe could not reach the session store");
            None
        }
        Err(e) => {
            warn!(error = %e, "Health probe did not complete");
            None
        }
    };

    let cache = state.registry.stats().cache;
    let (status, label) = match sessions {
        Some(_) => (StatusCode::OK, "ok"),
        None => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions,
            cache: CacheHealth {
                size: cache.size,
                capacity: cache.capacity,
            },
        }),
    )
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
