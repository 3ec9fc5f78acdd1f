//! HTTP API server for Warden.
//!
//! This crate is the thin request-handling layer in front of a
//! [`SessionRegistry`](warden_session::SessionRegistry):
//!
//! - `POST /login`, `POST /logout`, `POST /validate-token` for clients
//! - `POST /sessions/reconcile`, `GET /sessions/stats` for operators
//!   (bearer-token protected when an admin token is configured)
//! - `GET /health`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden_server::{Server, ServerConfig};
//! use warden_session::{MemoryStore, RegistryConfig, SessionRegistry};
//!
//! let registry = SessionRegistry::new(RegistryConfig::default(), Arc::new(MemoryStore::new()) as _);
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:5000".parse()?);
//!
//! Server::new(registry, config).run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use auth::admin_auth_middleware;
pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use logging::request_logging_middleware;
pub use state::{AppState, Registry, SharedStore};

use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::{Router, extract::DefaultBodyLimit, middleware};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The Warden HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server over the given registry.
    pub fn new(registry: Registry, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(registry, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::post;

        Router::new()
            .merge(routes::health_routes())
            .route("/login", post(routes::login_handler))
            .route("/logout", post(routes::logout_handler))
            .route("/validate-token", post(routes::validate_token_handler))
            .nest("/sessions", self.admin_routes())
            .fallback(not_found)
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(self.cors_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Operator routes, guarded by the admin token when one is set.
    fn admin_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route("/reconcile", post(routes::reconcile_handler))
            .route("/stats", get(routes::stats_handler))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::admin_auth_middleware,
            ))
    }

    /// Permissive CORS unless specific origins are configured.
    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if origins.is_empty() {
            layer.allow_origin(Any)
        } else {
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }

    /// Get the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn not_found() -> ServerError {
    ServerError::NotFound("Resource not found".to_string())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
