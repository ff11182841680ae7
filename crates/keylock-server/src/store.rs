//! PostgreSQL-backed license store.

use keylock_core::{LicenseRecord, LicenseStore, NewLicense, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::LicenseRow;

/// A [`LicenseStore`] over the `licenses` table.
#[derive(Debug, Clone)]
pub struct PgLicenseStore {
    pool: PgPool,
}

impl PgLicenseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Classifies a database error for callers of the store.
pub fn store_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateKey,
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
        _ => StoreError::Backend(e.to_string()),
    }
}

impl LicenseStore for PgLicenseStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        let row: Option<LicenseRow> = sqlx::query_as(
            r#"
            SELECT id, key, duration_days, created_at, valid_until, active, hwid
            FROM licenses
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(LicenseRecord::from))
    }

    async fn insert(&self, license: NewLicense) -> Result<LicenseRecord, StoreError> {
        let row: LicenseRow = sqlx::query_as(
            r#"
            INSERT INTO licenses (id, key, duration_days, created_at, valid_until, active, hwid)
            VALUES ($1, $2, $3, $4, $5, TRUE, NULL)
            RETURNING id, key, duration_days, created_at, valid_until, active, hwid
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&license.key)
        .bind(license.duration_days)
        .bind(license.created_at)
        .bind(license.valid_until)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.into())
    }

    async fn save(&self, record: &LicenseRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO licenses (id, key, duration_days, created_at, valid_until, active, hwid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (key) DO UPDATE
            SET active = EXCLUDED.active, hwid = EXCLUDED.hwid
            "#,
        )
        .bind(record.id)
        .bind(&record.key)
        .bind(record.duration_days)
        .bind(record.created_at)
        .bind(record.valid_until)
        .bind(record.active)
        .bind(&record.hwid)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn bind_hwid(&self, key: &str, hwid: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE licenses
            SET hwid = $2
            WHERE key = $1 AND hwid IS NULL AND active
            "#,
        )
        .bind(key)
        .bind(hwid)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<LicenseRecord>, StoreError> {
        let rows: Vec<LicenseRow> = sqlx::query_as(
            r#"
            SELECT id, key, duration_days, created_at, valid_until, active, hwid
            FROM licenses
            ORDER BY created_at DESC, key ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(LicenseRecord::from).collect())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM licenses")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.0)
    }

    async fn set_active(
        &self,
        key: &str,
        active: bool,
    ) -> Result<Option<LicenseRecord>, StoreError> {
        let row: Option<LicenseRow> = sqlx::query_as(
            r#"
            UPDATE licenses
            SET active = $2
            WHERE key = $1
            RETURNING id, key, duration_days, created_at, valid_until, active, hwid
            "#,
        )
        .bind(key)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(LicenseRecord::from))
    }

    async fn clear_hwid(&self, key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        let row: Option<LicenseRow> = sqlx::query_as(
            r#"
            UPDATE licenses
            SET hwid = NULL
            WHERE key = $1
            RETURNING id, key, duration_days, created_at, valid_until, active, hwid
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(LicenseRecord::from))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM licenses WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }
}
