//! Issuance of new, unbound licenses.

use chrono::{DateTime, Duration, Utc};

use crate::error::{IssueError, StoreError};
use crate::fingerprint::fingerprint;
use crate::record::{LicenseRecord, NewLicense};
use crate::store::LicenseStore;
use crate::token::generate_license_key;

/// Attempts at finding an unused key before issuance fails.
pub const MAX_KEY_ATTEMPTS: usize = 5;

/// Returns `created_at + duration_days`, or `None` if it is not representable.
///
/// Zero and negative durations are allowed and yield an expiry at or before
/// `created_at`.
pub fn compute_valid_until(created_at: DateTime<Utc>, duration_days: i32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(duration_days))
        .and_then(|duration| created_at.checked_add_signed(duration))
}

/// Creates licenses in a [`LicenseStore`].
///
/// Callers are expected to be authorized already.
#[derive(Debug, Clone)]
pub struct Issuer<S> {
    store: S,
    generate_key: fn() -> String,
}

impl<S: LicenseStore> Issuer<S> {
    pub fn new(store: S) -> Self {
        Self::with_key_generator(store, generate_license_key)
    }

    /// Uses `generate_key` instead of the secure default.
    pub fn with_key_generator(store: S, generate_key: fn() -> String) -> Self {
        Self {
            store,
            generate_key,
        }
    }

    /// Issues a license valid for `duration_days` from now.
    pub async fn issue(&self, duration_days: i32) -> Result<LicenseRecord, IssueError> {
        self.issue_at(duration_days, Utc::now()).await
    }

    /// Issues a license as of `now`.
    pub async fn issue_at(
        &self,
        duration_days: i32,
        now: DateTime<Utc>,
    ) -> Result<LicenseRecord, IssueError> {
        let valid_until = compute_valid_until(now, duration_days)
            .ok_or(IssueError::DurationOutOfRange(duration_days))?;

        if duration_days <= 0 {
            tracing::warn!(duration_days, "Issuing a license that is already expired");
        }

        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let license = NewLicense {
                key: (self.generate_key)(),
                duration_days,
                created_at: now,
                valid_until,
            };

            match self.store.insert(license).await {
                Ok(record) => {
                    tracing::info!(
                        key = %fingerprint(&record.key),
                        duration_days,
                        valid_until = %record.valid_until,
                        "Issued license"
                    );
                    return Ok(record);
                }
                Err(StoreError::DuplicateKey) => {
                    tracing::warn!(attempt, "Generated license key already exists, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(IssueError::KeysExhausted {
            attempts: MAX_KEY_ATTEMPTS,
        })
    }
}
