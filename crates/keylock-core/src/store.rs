//! Storage contract for license records.

use std::future::Future;

use crate::error::StoreError;
use crate::record::{LicenseRecord, NewLicense};

/// Durable storage of license records, keyed by unique license key.
///
/// Implementations are cheap handles (`Clone` shares the underlying store) and
/// may be used from many requests at once. The only write the validation path
/// performs is [`LicenseStore::bind_hwid`], which must be a single conditional
/// update.
pub trait LicenseStore: Send + Sync {
    /// Looks up a license by exact key.
    fn find_by_key(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<LicenseRecord>, StoreError>> + Send;

    /// Persists a new, active and unbound license and assigns its id.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the key is taken.
    fn insert(
        &self,
        license: NewLicense,
    ) -> impl Future<Output = Result<LicenseRecord, StoreError>> + Send;

    /// Upserts a record by key. For an existing key only `active` and `hwid`
    /// are written; the remaining fields are immutable.
    fn save(&self, record: &LicenseRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Sets `hwid` on the license with `key` only if it is currently unbound
    /// and active.
    ///
    /// Returns false if no row changed: the license is gone, already bound or
    /// was deactivated.
    fn bind_hwid(
        &self,
        key: &str,
        hwid: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Returns a page of licenses, newest first.
    fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<LicenseRecord>, StoreError>> + Send;

    /// Returns the total number of licenses.
    fn count(&self) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Activates or deactivates a license, returning the updated record.
    fn set_active(
        &self,
        key: &str,
        active: bool,
    ) -> impl Future<Output = Result<Option<LicenseRecord>, StoreError>> + Send;

    /// Removes the hwid binding, returning the updated record.
    fn clear_hwid(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<LicenseRecord>, StoreError>> + Send;

    /// Deletes a license. Returns false if it did not exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
