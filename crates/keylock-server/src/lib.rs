//! keylock server - HTTP API for license validation and administration
//!
//! This crate exposes the keylock validation engine over HTTP, persists
//! licenses in PostgreSQL and gates the management API behind an admin secret.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
pub use store::PgLicenseStore;
