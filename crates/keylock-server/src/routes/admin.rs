//! Administrative license management endpoints.
//!
//! Every route here sits behind [`crate::auth::require_admin`].

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use keylock_core::{format_timestamp, LicenseRecord, LicenseStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::require_admin;
use crate::error::AppError;
use crate::state::AppState;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Request body for issuing a license.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Validity in days. Zero or negative values issue an already expired license.
    pub duration_days: i32,
}

/// Response for a newly issued license.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLicense {
    pub key: String,
    pub duration_days: i32,
    /// When the license was issued (ISO 8601, UTC).
    pub created_at: String,
    /// When the license expires (ISO 8601, UTC).
    pub valid_until: String,
}

/// Full view of a stored license.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseView {
    pub id: Uuid,
    pub key: String,
    pub duration_days: i32,
    pub created_at: String,
    pub valid_until: String,
    pub active: bool,
    pub hwid: Option<String>,
    /// Whether `valid_until` had passed when the response was built.
    pub expired: bool,
}

/// Query parameters for listing licenses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// A page of licenses, newest first.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensePage {
    pub licenses: Vec<LicenseView>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

impl LicenseView {
    pub fn from_record(record: LicenseRecord, now: DateTime<Utc>) -> Self {
        Self {
            expired: record.is_expired_at(now),
            id: record.id,
            key: record.key,
            duration_days: record.duration_days,
            created_at: format_timestamp(record.created_at),
            valid_until: format_timestamp(record.valid_until),
            active: record.active,
            hwid: record.hwid,
        }
    }
}

impl From<LicenseRecord> for IssuedLicense {
    fn from(record: LicenseRecord) -> Self {
        Self {
            key: record.key,
            duration_days: record.duration_days,
            created_at: format_timestamp(record.created_at),
            valid_until: format_timestamp(record.valid_until),
        }
    }
}

impl ListParams {
    /// Returns (page, page_size) with defaults applied and bounds enforced.
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

/// Creates the admin router.
pub fn router<S>(state: AppState<S>) -> Router
where
    S: LicenseStore + Clone + 'static,
{
    Router::new()
        .route("/licenses", post(issue_license::<S>).get(list_licenses::<S>))
        .route(
            "/licenses/{key}",
            get(get_license::<S>).delete(delete_license::<S>),
        )
        .route("/licenses/{key}/activate", post(activate_license::<S>))
        .route("/licenses/{key}/deactivate", post(deactivate_license::<S>))
        .route("/licenses/{key}/hwid", delete(reset_hwid::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin::<S>,
        ))
        .with_state(state)
}

/// POST /api/v1/admin/licenses
///
/// Issues a new, unbound license.
async fn issue_license<S>(
    State(state): State<AppState<S>>,
    body: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuedLicense>), AppError>
where
    S: LicenseStore + Clone,
{
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let record = state.issuer().issue(request.duration_days).await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /api/v1/admin/licenses?page=1&pageSize=50
async fn list_licenses<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<LicensePage>, AppError>
where
    S: LicenseStore + Clone,
{
    let (page, page_size) = params.resolve();
    let offset = (page - 1).saturating_mul(page_size);

    let records = state.store.list(offset, page_size).await?;
    let total = state.store.count().await?;
    let now = Utc::now();

    Ok(Json(LicensePage {
        licenses: records
            .into_iter()
            .map(|record| LicenseView::from_record(record, now))
            .collect(),
        page,
        page_size,
        total,
    }))
}

fn not_found(key: &str) -> AppError {
    AppError::NotFound(format!("License {} does not exist", key))
}

/// GET /api/v1/admin/licenses/{key}
async fn get_license<S>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Json<LicenseView>, AppError>
where
    S: LicenseStore + Clone,
{
    let record = state
        .store
        .find_by_key(&key)
        .await?
        .ok_or_else(|| not_found(&key))?;

    Ok(Json(LicenseView::from_record(record, Utc::now())))
}

/// DELETE /api/v1/admin/licenses/{key}
async fn delete_license<S>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: LicenseStore + Clone,
{
    if !state.store.delete(&key).await? {
        return Err(not_found(&key));
    }
    tracing::info!(key = %keylock_core::fingerprint(&key), "Deleted license");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_active<S>(state: &AppState<S>, key: &str, active: bool) -> Result<LicenseView, AppError>
where
    S: LicenseStore + Clone,
{
    let record = state
        .store
        .set_active(key, active)
        .await?
        .ok_or_else(|| not_found(key))?;

    tracing::info!(
        key = %keylock_core::fingerprint(key),
        active,
        "Changed license activation"
    );
    Ok(LicenseView::from_record(record, Utc::now()))
}

/// POST /api/v1/admin/licenses/{key}/activate
async fn activate_license<S>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Json<LicenseView>, AppError>
where
    S: LicenseStore + Clone,
{
    set_active(&state, &key, true).await.map(Json)
}

/// POST /api/v1/admin/licenses/{key}/deactivate
async fn deactivate_license<S>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Json<LicenseView>, AppError>
where
    S: LicenseStore + Clone,
{
    set_active(&state, &key, false).await.map(Json)
}

/// DELETE /api/v1/admin/licenses/{key}/hwid
///
/// Clears the hardware binding so the next validation binds a new machine.
async fn reset_hwid<S>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Json<LicenseView>, AppError>
where
    S: LicenseStore + Clone,
{
    let record = state
        .store
        .clear_hwid(&key)
        .await?
        .ok_or_else(|| not_found(&key))?;

    tracing::info!(key = %keylock_core::fingerprint(&key), "Cleared hardware binding");
    Ok(Json(LicenseView::from_record(record, Utc::now())))
}
