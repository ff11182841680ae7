// keylock core - license records, validation with hwid binding, and issuance

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod issuance;
pub mod memory;
pub mod record;
pub mod store;
pub mod token;
pub mod verdict;

pub use engine::{evaluate, is_well_formed, Decision, Validator, MAX_BIND_ATTEMPTS};
pub use error::{IssueError, StoreError, ValidationError};
pub use fingerprint::{fingerprint, sha256_hex};
pub use issuance::{compute_valid_until, Issuer, MAX_KEY_ATTEMPTS};
pub use memory::MemoryLicenseStore;
pub use record::{LicenseRecord, NewLicense, MAX_HWID_LEN, MAX_KEY_LEN};
pub use store::LicenseStore;
pub use token::generate_license_key;
pub use verdict::{format_timestamp, Reason, Status, Verdict};
