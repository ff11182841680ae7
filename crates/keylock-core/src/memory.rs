//! In-process license store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{LicenseRecord, NewLicense};
use crate::store::LicenseStore;

/// A [`LicenseStore`] backed by a mutex-guarded map.
///
/// Every operation holds the lock for its whole duration, so `bind_hwid` is
/// atomic with respect to concurrent validations.
#[derive(Debug, Clone, Default)]
pub struct MemoryLicenseStore {
    licenses: Arc<Mutex<HashMap<String, LicenseRecord>>>,
}

impl MemoryLicenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, LicenseRecord>> {
        self.licenses.lock()
    }

    fn update<F>(&self, key: &str, apply: F) -> Result<Option<LicenseRecord>, StoreError>
    where
        F: FnOnce(&mut LicenseRecord),
    {
        let mut licenses = self.lock();
        Ok(licenses.get_mut(key).map(|record| {
            apply(record);
            record.clone()
        }))
    }
}

impl LicenseStore for MemoryLicenseStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn insert(&self, license: NewLicense) -> Result<LicenseRecord, StoreError> {
        let mut licenses = self.lock();
        if licenses.contains_key(&license.key) {
            return Err(StoreError::DuplicateKey);
        }
        let record = license.into_record(Uuid::new_v4());
        licenses.insert(record.key.clone(), record.clone());
        Ok(record)
    }

    async fn save(&self, record: &LicenseRecord) -> Result<(), StoreError> {
        let mut licenses = self.lock();
        match licenses.get_mut(&record.key) {
            Some(existing) => {
                existing.active = record.active;
                existing.hwid = record.hwid.clone();
            }
            None => {
                licenses.insert(record.key.clone(), record.clone());
            }
        }
        Ok(())
    }

    async fn bind_hwid(&self, key: &str, hwid: &str) -> Result<bool, StoreError> {
        let mut licenses = self.lock();
        match licenses.get_mut(key) {
            Some(record) if record.active && record.hwid.is_none() => {
                record.hwid = Some(hwid.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<LicenseRecord>, StoreError> {
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);

        let mut records: Vec<LicenseRecord> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.lock().len() as i64)
    }

    async fn set_active(
        &self,
        key: &str,
        active: bool,
    ) -> Result<Option<LicenseRecord>, StoreError> {
        self.update(key, |record| record.active = active)
    }

    async fn clear_hwid(&self, key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        self.update(key, |record| record.hwid = None)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().remove(key).is_some())
    }
}
