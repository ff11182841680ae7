//! API routes for the keylock server.

pub mod admin;
pub mod licenses;

use axum::{routing::get, Router};
use keylock_core::LicenseStore;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Creates the main API router with all routes mounted.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: LicenseStore + Clone + 'static,
{
    Router::new()
        .route("/", get(home))
        .merge(legacy_routes(state.clone()))
        .nest("/api/v1", api_v1_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Creates the v1 API routes.
fn api_v1_routes<S>(state: AppState<S>) -> Router
where
    S: LicenseStore + Clone + 'static,
{
    Router::new()
        .nest("/licenses", licenses::router(state.clone()))
        .nest("/admin", admin::router(state))
}

/// Paths used by clients deployed before the v1 API.
fn legacy_routes<S>(state: AppState<S>) -> Router
where
    S: LicenseStore + Clone + 'static,
{
    Router::new()
        .route("/api/check_license", get(licenses::check_license::<S>))
        .with_state(state)
}

/// GET /
///
/// Liveness check.
async fn home() -> &'static str {
    "keylock license server running"
}
