//! Database row model for licenses.

use chrono::{DateTime, Utc};
use keylock_core::LicenseRecord;
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `licenses` table.
#[derive(Debug, Clone, FromRow)]
pub struct LicenseRow {
    /// Unique identifier for this license record.
    pub id: Uuid,
    /// The license key (unique).
    pub key: String,
    /// Duration the license was issued for.
    pub duration_days: i32,
    /// When this license was issued.
    pub created_at: DateTime<Utc>,
    /// End of validity.
    pub valid_until: DateTime<Utc>,
    /// False once deactivated by an administrator.
    pub active: bool,
    /// Bound hardware id (null until first validation).
    pub hwid: Option<String>,
}

impl From<LicenseRow> for LicenseRecord {
    fn from(row: LicenseRow) -> Self {
        LicenseRecord {
            id: row.id,
            key: row.key,
            duration_days: row.duration_days,
            created_at: row.created_at,
            valid_until: row.valid_until,
            active: row.active,
            hwid: row.hwid,
        }
    }
}
