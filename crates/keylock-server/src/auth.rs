//! Admin gate for the management API.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use keylock_core::LicenseStore;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Compares a presented secret with the configured one in constant time.
pub fn secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Rejects requests that do not carry the admin password as a bearer token.
pub async fn require_admin<S>(
    State(state): State<AppState<S>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: LicenseStore + Clone,
{
    let presented = extract_bearer_token(request.headers())
        .map(|token| secret_matches(token, state.admin_password()));

    match presented {
        Some(true) => Ok(next.run(request).await),
        Some(false) => {
            tracing::warn!("Rejected admin request with wrong credentials");
            Err(AppError::Unauthorized)
        }
        None => Err(AppError::Unauthorized),
    }
}
