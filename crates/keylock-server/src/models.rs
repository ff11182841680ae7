//! Database models for keylock.

pub mod license;

pub use license::LicenseRow;
