// Shared fixtures for keylock-core integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use keylock_core::{LicenseRecord, LicenseStore, MemoryLicenseStore, NewLicense, StoreError};

/// Inserts a license issued at `created_at` for `days` days.
pub async fn seed(
    store: &MemoryLicenseStore,
    key: &str,
    created_at: DateTime<Utc>,
    days: i32,
) -> LicenseRecord {
    store
        .insert(NewLicense {
            key: key.to_string(),
            duration_days: days,
            created_at,
            valid_until: created_at + Duration::days(i64::from(days)),
        })
        .await
        .expect("seed license")
}

/// A store whose every operation fails as if the database were down.
#[derive(Debug, Clone, Default)]
pub struct UnavailableStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

impl LicenseStore for UnavailableStore {
    async fn find_by_key(&self, _key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        down()
    }
    async fn insert(&self, _license: NewLicense) -> Result<LicenseRecord, StoreError> {
        down()
    }
    async fn save(&self, _record: &LicenseRecord) -> Result<(), StoreError> {
        down()
    }
    async fn bind_hwid(&self, _key: &str, _hwid: &str) -> Result<bool, StoreError> {
        down()
    }
    async fn list(&self, _offset: i64, _limit: i64) -> Result<Vec<LicenseRecord>, StoreError> {
        down()
    }
    async fn count(&self) -> Result<i64, StoreError> {
        down()
    }
    async fn set_active(
        &self,
        _key: &str,
        _active: bool,
    ) -> Result<Option<LicenseRecord>, StoreError> {
        down()
    }
    async fn clear_hwid(&self, _key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        down()
    }
    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        down()
    }
}

/// What happens to the license between the engine's read and its
/// conditional write.
#[derive(Debug, Clone)]
pub enum Race {
    /// Another machine binds the license, exactly once.
    Rival(String),
    /// An admin deactivates the license, exactly once.
    Deactivate,
    /// The conditional write never applies while the license stays unbound,
    /// as if an admin kept clearing the binding.
    AlwaysLose,
}

#[derive(Debug, Clone)]
pub struct RacingStore {
    pub inner: MemoryLicenseStore,
    pub race: Race,
    raced: Arc<AtomicBool>,
}

impl RacingStore {
    pub fn new(inner: MemoryLicenseStore, rival_hwid: &str) -> Self {
        Self::with_race(inner, Race::Rival(rival_hwid.to_string()))
    }

    pub fn deactivating(inner: MemoryLicenseStore) -> Self {
        Self::with_race(inner, Race::Deactivate)
    }

    pub fn always_losing(inner: MemoryLicenseStore) -> Self {
        Self::with_race(inner, Race::AlwaysLose)
    }

    fn with_race(inner: MemoryLicenseStore, race: Race) -> Self {
        Self {
            inner,
            race,
            raced: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl LicenseStore for RacingStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        self.inner.find_by_key(key).await
    }
    async fn insert(&self, license: NewLicense) -> Result<LicenseRecord, StoreError> {
        self.inner.insert(license).await
    }
    async fn save(&self, record: &LicenseRecord) -> Result<(), StoreError> {
        self.inner.save(record).await
    }
    async fn bind_hwid(&self, key: &str, hwid: &str) -> Result<bool, StoreError> {
        let first = !self.raced.swap(true, Ordering::SeqCst);
        match &self.race {
            Race::AlwaysLose => return Ok(false),
            Race::Rival(rival) if first => {
                assert!(self.inner.bind_hwid(key, rival).await?);
            }
            Race::Deactivate if first => {
                assert!(self.inner.set_active(key, false).await?.is_some());
            }
            _ => {}
        }
        self.inner.bind_hwid(key, hwid).await
    }
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<LicenseRecord>, StoreError> {
        self.inner.list(offset, limit).await
    }
    async fn count(&self) -> Result<i64, StoreError> {
        self.inner.count().await
    }
    async fn set_active(
        &self,
        key: &str,
        active: bool,
    ) -> Result<Option<LicenseRecord>, StoreError> {
        self.inner.set_active(key, active).await
    }
    async fn clear_hwid(&self, key: &str) -> Result<Option<LicenseRecord>, StoreError> {
        self.inner.clear_hwid(key).await
    }
    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key).await
    }
}
