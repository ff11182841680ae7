//! License validation and first-use hwid binding.
//!
//! A license becomes machine-locked the first time it validates: the first
//! hwid presented for an unbound, active, unexpired license is written with a
//! conditional update and every later validation must present that same hwid.
//!
//! Rules are applied in order and the first match decides the verdict:
//!
//! 1. unknown key: `NOT_FOUND`
//! 2. deactivated: `DEACTIVATED`
//! 3. `now >= valid_until`: `EXPIRED`
//! 4. bound to another hwid: `HWID_MISMATCH`
//! 5. otherwise `VALID`, binding the hwid if the license was unbound

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::fingerprint::fingerprint;
use crate::record::{LicenseRecord, MAX_HWID_LEN, MAX_KEY_LEN};
use crate::store::LicenseStore;
use crate::verdict::{Reason, Verdict};

/// How many times a lost binding race is re-evaluated before giving up.
pub const MAX_BIND_ATTEMPTS: usize = 3;

/// Outcome of applying the rules to a single record snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Reject(Reason),
    /// Already bound to the presented hwid; nothing to write.
    Accept,
    /// Unbound; the presented hwid must be bound before accepting.
    Bind,
}

/// Returns true if a (key, hwid) pair may be looked up at all.
///
/// Both values must be non-blank, free of control characters and fit their
/// columns. Lengths are counted in characters, as the columns are.
pub fn is_well_formed(key: &str, hwid: &str) -> bool {
    let fits = |value: &str, max: usize| {
        !value.trim().is_empty()
            && !value.chars().any(char::is_control)
            && value.chars().count() <= max
    };
    fits(key, MAX_KEY_LEN) && fits(hwid, MAX_HWID_LEN)
}

/// Applies rules 2-5 to a record.
pub fn evaluate(record: &LicenseRecord, hwid: &str, now: DateTime<Utc>) -> Decision {
    if !record.active {
        return Decision::Reject(Reason::Deactivated);
    }
    if record.is_expired_at(now) {
        return Decision::Reject(Reason::Expired);
    }
    if record.is_bound_elsewhere(hwid) {
        return Decision::Reject(Reason::HwidMismatch);
    }
    if record.is_bound() {
        Decision::Accept
    } else {
        Decision::Bind
    }
}

/// Validates licenses against a [`LicenseStore`].
#[derive(Debug, Clone)]
pub struct Validator<S> {
    store: S,
}

impl<S: LicenseStore> Validator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates `key` for `hwid` at the current time.
    pub async fn validate(&self, key: &str, hwid: &str) -> Result<Verdict, ValidationError> {
        self.validate_at(key, hwid, Utc::now()).await
    }

    /// Validates `key` for `hwid` as of `now`.
    ///
    /// Rejections are returned as `Ok` verdicts. `Err` means the store failed
    /// and the license state is unknown.
    pub async fn validate_at(
        &self,
        key: &str,
        hwid: &str,
        now: DateTime<Utc>,
    ) -> Result<Verdict, ValidationError> {
        if !is_well_formed(key, hwid) {
            tracing::debug!("Rejecting malformed validation request");
            return Ok(Verdict::malformed());
        }

        let key_fp = fingerprint(key);

        for attempt in 1..=MAX_BIND_ATTEMPTS {
            let Some(record) = self.store.find_by_key(key).await? else {
                tracing::debug!(key = %key_fp, "License not found");
                return Ok(Verdict::rejected(Reason::NotFound));
            };

            match evaluate(&record, hwid, now) {
                Decision::Reject(reason) => {
                    tracing::debug!(key = %key_fp, %reason, "License rejected");
                    return Ok(Verdict::rejected(reason));
                }
                Decision::Accept => {
                    return Ok(Verdict::valid(record.valid_until, hwid.to_string()));
                }
                Decision::Bind => {
                    if self.store.bind_hwid(key, hwid).await? {
                        tracing::info!(
                            key = %key_fp,
                            hwid = %fingerprint(hwid),
                            "License bound to hardware id"
                        );
                        return Ok(Verdict::valid(record.valid_until, hwid.to_string()));
                    }
                    // Another validation bound the license, or an admin
                    // deactivated or deleted it, between our read and write.
                    // Re-read and decide again.
                    tracing::debug!(key = %key_fp, attempt, "Lost hwid binding race");
                }
            }
        }

        tracing::warn!(key = %key_fp, "Giving up on contended hwid binding");
        Err(ValidationError::Contention {
            attempts: MAX_BIND_ATTEMPTS,
        })
    }
}
