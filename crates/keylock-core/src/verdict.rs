//! Validation verdicts returned to license holders.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse outcome category of a validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Valid,
    Invalid,
    Error,
}

/// Reason code for a validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    /// No license exists for the key.
    NotFound,
    /// The license was disabled by an administrator.
    Deactivated,
    /// The license is past its `valid_until`.
    Expired,
    /// The license is bound to another machine.
    HwidMismatch,
    /// The key or hwid was missing or out of bounds.
    Malformed,
    /// The license is valid for the presented machine.
    Valid,
}

impl Reason {
    /// Returns the coarse status for this reason.
    pub fn status(self) -> Status {
        match self {
            Reason::Valid => Status::Valid,
            Reason::Malformed => Status::Error,
            Reason::NotFound | Reason::Deactivated | Reason::Expired | Reason::HwidMismatch => {
                Status::Invalid
            }
        }
    }

    /// Returns the wire code, e.g. `HWID_MISMATCH`.
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::NotFound => "NOT_FOUND",
            Reason::Deactivated => "DEACTIVATED",
            Reason::Expired => "EXPIRED",
            Reason::HwidMismatch => "HWID_MISMATCH",
            Reason::Malformed => "MALFORMED",
            Reason::Valid => "VALID",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of validating a (key, hwid) pair.
///
/// `valid_until` and `hwid` are only present on [`Reason::Valid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub status: Status,
    pub reason: Reason,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp"
    )]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hwid: Option<String>,
}

impl Verdict {
    /// An accepting verdict for a license bound to `hwid`.
    pub fn valid(valid_until: DateTime<Utc>, hwid: String) -> Self {
        Self {
            status: Status::Valid,
            reason: Reason::Valid,
            valid_until: Some(valid_until),
            hwid: Some(hwid),
        }
    }

    /// A verdict carrying only a reason code.
    pub fn rejected(reason: Reason) -> Self {
        Self {
            status: reason.status(),
            reason,
            valid_until: None,
            hwid: None,
        }
    }

    pub fn malformed() -> Self {
        Self::rejected(Reason::Malformed)
    }

    pub fn is_valid(&self) -> bool {
        self.reason == Reason::Valid
    }
}

/// Formats a timestamp the way every API response renders it:
/// RFC 3339 in UTC, second precision, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serde adapter for optional timestamps in [`format_timestamp`] form.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(at) => serializer.serialize_str(&super::format_timestamp(*at)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|at| at.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
