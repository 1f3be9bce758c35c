//! Share token and subject identity.
//!
//! # Responsibility
//! - Carry the authorization record a share token resolves to.
//! - Decide whether a token is inside its validity window.
//!
//! # Invariants
//! - A token resolves to at most one subject.
//! - Tokens are immutable here; issuance happens elsewhere.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identity whose records are shared. Used only as a storage partition key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SubjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authorization record stored under a share token value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareToken {
    /// Opaque token value, also the lookup key.
    pub token: String,
    /// Subject whose records the token exposes.
    pub subject_id: SubjectId,
    /// Unix epoch milliseconds; token is not usable before this instant.
    pub issued_at_ms: Option<i64>,
    /// Unix epoch milliseconds; token is not usable at or after this instant.
    pub expires_at_ms: Option<i64>,
}

/// Why a presented token cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidTokenReason {
    /// No token record exists under the presented value.
    NotFound,
    /// Token exists but its validity window has ended.
    Expired,
    /// Token exists but its validity window has not started.
    NotYetValid,
}

impl InvalidTokenReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::NotYetValid => "not_yet_valid",
        }
    }
}

impl ShareToken {
    pub fn new(token: impl Into<String>, subject_id: SubjectId) -> Self {
        Self {
            token: token.into(),
            subject_id,
            issued_at_ms: None,
            expires_at_ms: None,
        }
    }

    /// Checks the validity window against `now_ms`.
    ///
    /// Tokens without window bounds are always valid.
    pub fn check_validity(&self, now_ms: i64) -> Result<(), InvalidTokenReason> {
        if let Some(issued_at) = self.issued_at_ms {
            if now_ms < issued_at {
                return Err(InvalidTokenReason::NotYetValid);
            }
        }
        if let Some(expires_at) = self.expires_at_ms {
            if now_ms >= expires_at {
                return Err(InvalidTokenReason::Expired);
            }
        }
        Ok(())
    }
}

/// Normalizes a presented token value.
///
/// Returns `None` for missing or whitespace-only input, which means "nothing
/// requested" rather than an invalid token.
pub fn normalize_token(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
