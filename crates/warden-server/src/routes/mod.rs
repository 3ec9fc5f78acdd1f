//! API route handlers.

pub mod health;
pub mod sessions;

pub use health::{HealthResponse, health_routes};
pub use sessions::{
    LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, ReconcileRequest,
    ReconcileResponse, StatsResponse, ValidateRequest, ValidateResponse, login_handler,
    logout_handler, reconcile_handler, stats_handler, validate_token_handler,
};
