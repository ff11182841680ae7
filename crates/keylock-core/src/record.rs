//! License record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a license key, matching the `licenses.key` column.
pub const MAX_KEY_LEN: usize = 64;

/// Maximum length of a hardware identifier, matching the `licenses.hwid` column.
pub const MAX_HWID_LEN: usize = 128;

/// A stored license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// The license key presented by clients. Unique and immutable.
    pub key: String,
    /// Duration the license was issued for, in days.
    pub duration_days: i32,
    /// When the license was issued.
    pub created_at: DateTime<Utc>,
    /// End of validity (`created_at + duration_days`).
    pub valid_until: DateTime<Utc>,
    /// Cleared by an administrator to disable the license.
    pub active: bool,
    /// Hardware identifier the license is bound to (null until first use).
    pub hwid: Option<String>,
}

/// Data required to create a new license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLicense {
    pub key: String,
    pub duration_days: i32,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl LicenseRecord {
    /// Returns true if the license is no longer valid at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_until
    }

    /// Returns true if a hardware identifier has been bound.
    pub fn is_bound(&self) -> bool {
        self.hwid.is_some()
    }

    /// Returns true if the license is bound to a different hardware identifier.
    pub fn is_bound_elsewhere(&self, hwid: &str) -> bool {
        matches!(&self.hwid, Some(bound) if bound != hwid)
    }
}

impl NewLicense {
    /// Builds the record a store persists for this license.
    ///
    /// New licenses start active and unbound.
    pub fn into_record(self, id: Uuid) -> LicenseRecord {
        LicenseRecord {
            id,
            key: self.key,
            duration_days: self.duration_days,
            created_at: self.created_at,
            valid_until: self.valid_until,
            active: true,
            hwid: None,
        }
    }
}
