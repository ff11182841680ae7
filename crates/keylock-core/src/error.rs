//! Error types for license storage, validation and issuance.
//!
//! Business-rule rejections are not errors; they are [`crate::Verdict`]s.
//! Everything here means the license state could not be determined or changed.

use thiserror::Error;

/// Failures reported by a [`crate::LicenseStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A license with the same key already exists.
    #[error("license key already exists")]
    DuplicateKey,

    /// The store could not be reached (connection loss, pool exhaustion).
    #[error("license store unavailable: {0}")]
    Unavailable(String),

    /// Any other storage failure.
    #[error("license store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Failures while validating a license.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The hwid binding kept changing underneath the engine.
    #[error("hwid binding changed concurrently {attempts} times")]
    Contention { attempts: usize },
}

/// Failures while issuing a license.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The expiry for this duration is not a representable timestamp.
    #[error("duration of {0} days is out of range")]
    DurationOutOfRange(i32),

    /// Every generated key collided with an existing one.
    #[error("no unique license key after {attempts} attempts")]
    KeysExhausted { attempts: usize },
}
