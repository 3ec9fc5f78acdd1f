//! Bearer-token guard for admin routes.
//!
//! Token comparison uses constant-time comparison to prevent timing attacks.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::error::ServerError;
use crate::state::AppState;

/// Compare two strings in constant time.
///
/// Lengths are compared first; unequal lengths still perform a dummy
/// comparison before returning false.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() == b_bytes.len() {
        a_bytes.ct_eq(b_bytes).into()
    } else {
        let _ = a_bytes.ct_eq(a_bytes);
        false
    }
}

/// Check the request against the configured admin token.
fn authorize(request: &Request<Body>, state: &AppState) -> Result<(), ServerError> {
    let Some(expected) = state.config().admin_token.as_deref() else {
        return Ok(());
    };

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ServerError::Unauthorized("missing authorization token".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| ServerError::BadRequest("invalid authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServerError::BadRequest("expected a Bearer token".to_string()))?;

    if constant_time_eq(token, expected) {
        Ok(())
    } else {
        Err(ServerError::Unauthorized("invalid token".to_string()))
    }
}

/// Admin authentication middleware.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    authorize(&request, &state)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret-longer"));
        assert!(!constant_time_eq("", "x"));
    }
}
