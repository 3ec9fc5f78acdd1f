//! Request logging middleware.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Which part of the API a request hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Health,
    Admin,
    Client,
}

impl Surface {
    fn of(path: &str) -> Self {
        if path == "/health" {
            Surface::Health
        } else if path.starts_with("/sessions") {
            Surface::Admin
        } else {
            Surface::Client
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Surface::Health => "health",
            Surface::Admin => "admin",
            Surface::Client => "client",
        }
    }
}

/// Log one line per request with its API surface, status and latency.
///
/// Bodies are never read here; they carry session tokens. Health probes log
/// at debug, and a 404 from `/validate-token` is an ordinary rejected token
/// rather than a client error.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let kind = Surface::of(&path);

    let started = Instant::now();
    let response = next.run(request).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let code = response.status();
    let token_rejected = path == "/validate-token" && code == StatusCode::NOT_FOUND;
    let surface = kind.as_str();
    let status = code.as_u16();

    if code.is_server_error() {
        error!(%method, %path, surface, status, latency_ms, "Request failed");
    } else if code.is_client_error() && !token_rejected {
        warn!(%method, %path, surface, status, latency_ms, "Request rejected");
    } else if kind == Surface::Health {
        debug!(%method, %path, surface, status, latency_ms, "Health probe");
    } else {
        info!(%method, %path, surface, status, latency_ms, "Request completed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_classification() {
        assert_eq!(Surface::of("/health"), Surface::Health);
        assert_eq!(Surface::of("/sessions/reconcile"), Surface::Admin);
        assert_eq!(Surface::of("/sessions/stats"), Surface::Admin);
        assert_eq!(Surface::of("/login"), Surface::Client);
        assert_eq!(Surface::of("/validate-token"), Surface::Client);
    }
}
