//! Public license check endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use keylock_core::{LicenseStore, Reason, Verdict};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Query parameters of a license check. Both are optional here so that a
/// missing value produces a `MALFORMED` verdict rather than a framework error.
#[derive(Debug, Default, Deserialize)]
pub struct CheckParams {
    pub key: Option<String>,
    pub hwid: Option<String>,
}

/// Creates the public licenses router.
pub fn router<S>(state: AppState<S>) -> Router
where
    S: LicenseStore + Clone + 'static,
{
    Router::new()
        .route("/check", get(check_license::<S>))
        .with_state(state)
}

/// HTTP status returned alongside each verdict.
pub fn verdict_status_code(reason: Reason) -> StatusCode {
    match reason {
        Reason::Valid => StatusCode::OK,
        Reason::Malformed => StatusCode::BAD_REQUEST,
        Reason::NotFound => StatusCode::NOT_FOUND,
        Reason::Deactivated | Reason::Expired => StatusCode::FORBIDDEN,
        Reason::HwidMismatch => StatusCode::CONFLICT,
    }
}

/// GET /api/v1/licenses/check?key=...&hwid=...
///
/// Validates a license for a machine, binding the machine on first use.
/// Also served at the legacy path `/api/check_license`.
pub async fn check_license<S>(
    State(state): State<AppState<S>>,
    params: Result<Query<CheckParams>, QueryRejection>,
) -> Result<(StatusCode, Json<Verdict>), AppError>
where
    S: LicenseStore + Clone,
{
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let key = params.key.as_deref().unwrap_or_default();
    let hwid = params.hwid.as_deref().unwrap_or_default();

    let verdict = state.validator().validate(key, hwid).await?;

    Ok((verdict_status_code(verdict.reason), Json(verdict)))
}
