//! Share token resolution.
//!
//! # Responsibility
//! - Turn a presented token value into the subject it grants access to.
//! - Separate "token unusable" from "store unavailable".
//!
//! # Invariants
//! - Exactly one store lookup per call; no other reads.
//! - Unknown, expired and not-yet-valid tokens are `TokenInvalid`.
//! - Store failures (including timeouts) are `LookupFailed`, never
//!   `TokenInvalid`.

use crate::model::share_token::{InvalidTokenReason, SubjectId};
use crate::repo::error::RepoError;
use crate::repo::token_repo::ShareTokenRepository;
use crate::service::clock::Clock;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure to resolve a token to a subject.
#[derive(Debug)]
pub enum LookupError {
    TokenInvalid(InvalidTokenReason),
    LookupFailed(RepoError),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenInvalid(reason) => write!(f, "share token invalid: {}", reason.as_str()),
            Self::LookupFailed(err) => write!(f, "share token lookup failed: {err}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TokenInvalid(_) => None,
            Self::LookupFailed(err) => Some(err),
        }
    }
}

/// Resolves share tokens against a token repository.
pub struct TokenResolver<R: ShareTokenRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: ShareTokenRepository, C: Clock> TokenResolver<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Resolves `token` to its subject.
    ///
    /// `token` is expected to be non-empty; callers handle the "no token"
    /// case before reaching the store.
    pub fn resolve(&self, token: &str) -> Result<SubjectId, LookupError> {
        let record = self
            .repo
            .find_share_token(token)
            .map_err(LookupError::LookupFailed)?
            .ok_or(LookupError::TokenInvalid(InvalidTokenReason::NotFound))?;

        record
            .check_validity(self.clock.now_ms())
            .map_err(LookupError::TokenInvalid)?;

        Ok(record.subject_id)
    }
}
