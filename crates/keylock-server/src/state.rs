//! Shared request state.

use std::sync::Arc;

use keylock_core::{Issuer, LicenseStore, Validator};

/// State handed to every handler: the license store and the admin secret.
#[derive(Debug, Clone)]
pub struct AppState<S> {
    pub store: S,
    admin_password: Arc<str>,
}

impl<S: LicenseStore + Clone> AppState<S> {
    pub fn new(store: S, admin_password: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            admin_password: admin_password.into(),
        }
    }

    pub fn validator(&self) -> Validator<S> {
        Validator::new(self.store.clone())
    }

    pub fn issuer(&self) -> Issuer<S> {
        Issuer::new(self.store.clone())
    }

    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }
}
