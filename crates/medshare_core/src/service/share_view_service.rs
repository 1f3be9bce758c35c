//! Token-scoped aggregation of per-subject record categories.
//!
//! # Responsibility
//! - Gate every read on token resolution.
//! - Fan out one read per category in [`Category::ALL`] and merge the
//!   non-empty ones into an [`AggregateResult`].
//! - Map every failure to one well-defined terminal outcome.
//!
//! # Invariants
//! - Missing or blank token: no store access at all.
//! - Invalid token or failed lookup: zero category reads.
//! - Resolved token: exactly one read per category, for the resolved subject.
//! - A failing category is omitted; it never fails the request.
//! - The result is returned only after every category read has settled.

use crate::config::ShareViewConfig;
use crate::model::aggregate::{AggregateResult, ShareView};
use crate::model::category::Category;
use crate::logging::redact_token;
use crate::model::share_token::{normalize_token, InvalidTokenReason, SubjectId};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::guard::{CancelFlag, QueryGuard};
use crate::repo::token_repo::{ShareTokenRepository, SqliteShareTokenRepository};
use crate::service::clock::{Clock, SystemClock};
use crate::service::token_service::{LookupError, TokenResolver};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const MSG_INVALID_TOKEN: &str = "Invalid or expired token.";
const MSG_TRANSIENT_FAILURE: &str = "An error occurred while fetching data.";
const MSG_CANCELLED: &str = "Request cancelled.";

/// Request-level failure of a share view.
#[derive(Debug)]
pub enum ShareViewError {
    /// Token unknown or outside its validity window.
    InvalidToken(InvalidTokenReason),
    /// Token lookup could not reach the store; safe to retry.
    TransientFailure(RepoError),
    /// Caller abandoned the request.
    Cancelled,
}

/// Data-free classification of [`ShareViewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareViewErrorKind {
    InvalidToken,
    TransientFailure,
    Cancelled,
}

impl ShareViewErrorKind {
    /// Message shown to the person holding the link.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::InvalidToken => MSG_INVALID_TOKEN,
            Self::TransientFailure => MSG_TRANSIENT_FAILURE,
            Self::Cancelled => MSG_CANCELLED,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, Self::TransientFailure)
    }
}

impl ShareViewError {
    pub fn kind(&self) -> ShareViewErrorKind {
        match self {
            Self::InvalidToken(_) => ShareViewErrorKind::InvalidToken,
            Self::TransientFailure(_) => ShareViewErrorKind::TransientFailure,
            Self::Cancelled => ShareViewErrorKind::Cancelled,
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

impl Display for ShareViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidToken(reason) => write!(f, "invalid share token ({})", reason.as_str()),
            Self::TransientFailure(err) => write!(f, "share token lookup failed: {err}"),
            Self::Cancelled => write!(f, "share view request cancelled"),
        }
    }
}

impl Error for ShareViewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TransientFailure(err) => Some(err),
            Self::InvalidToken(_) | Self::Cancelled => None,
        }
    }
}

/// One category that could not be read; logged, never surfaced.
#[derive(Debug)]
pub struct CategoryFetchFailed {
    pub category: Category,
    pub error: RepoError,
}

impl Display for CategoryFetchFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "category `{}` fetch failed: {}", self.category, self.error)
    }
}

/// Aggregates a subject's record categories behind a share token.
pub struct ShareViewService<T, R, C = SystemClock>
where
    T: ShareTokenRepository,
    R: CategoryRepository,
    C: Clock,
{
    resolver: TokenResolver<T, C>,
    categories: R,
    cancel: CancelFlag,
}

impl<T, R> ShareViewService<T, R, SystemClock>
where
    T: ShareTokenRepository,
    R: CategoryRepository,
{
    /// Creates a service that checks token windows against the system clock.
    pub fn new(tokens: T, categories: R) -> Self {
        Self::with_clock(tokens, categories, SystemClock)
    }
}

impl<T, R, C> ShareViewService<T, R, C>
where
    T: ShareTokenRepository,
    R: CategoryRepository,
    C: Clock,
{
    pub fn with_clock(tokens: T, categories: R, clock: C) -> Self {
        Self {
            resolver: TokenResolver::new(tokens, clock),
            categories,
            cancel: CancelFlag::new(),
        }
    }

    /// Uses `cancel` to stop between reads when the caller goes away.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolves `token` and aggregates every non-empty category.
    ///
    /// # Contract
    /// - `None` or blank token -> `Ok(ShareView::NoDataRequested)`, no reads.
    /// - Unknown/expired token -> `Err(InvalidToken)`, no category reads.
    /// - Lookup failure -> `Err(TransientFailure)`, no category reads.
    /// - Otherwise `Ok(ShareView::Completed)` holding only categories with
    ///   at least one record; failed categories are left out.
    pub fn aggregate(&self, token: Option<&str>) -> Result<ShareView, ShareViewError> {
        let request_id = Uuid::new_v4();
        let started_at = Instant::now();

        let Some(token) = normalize_token(token) else {
            info!(
                "event=share_view module=service status=ok request_id={} outcome=no_data_requested",
                request_id
            );
            return Ok(ShareView::NoDataRequested);
        };

        info!(
            "event=share_view module=service status=start request_id={} token={}",
            request_id,
            redact_token(token)
        );

        if self.cancel.is_cancelled() {
            return Err(self.log_cancelled(request_id, started_at));
        }

        let subject = match self.resolver.resolve(token) {
            Ok(subject) => subject,
            Err(LookupError::TokenInvalid(reason)) => {
                warn!(
                    "event=share_view module=service status=error request_id={} duration_ms={} error_code=invalid_token reason={}",
                    request_id,
                    started_at.elapsed().as_millis(),
                    reason.as_str()
                );
                return Err(ShareViewError::InvalidToken(reason));
            }
            Err(LookupError::LookupFailed(RepoError::Cancelled)) => {
                return Err(self.log_cancelled(request_id, started_at));
            }
            Err(LookupError::LookupFailed(err)) => {
                error!(
                    "event=share_view module=service status=error request_id={} duration_ms={} error_code=token_lookup_failed cause={} error={}",
                    request_id,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                return Err(ShareViewError::TransientFailure(err));
            }
        };

        let Some((result, failures)) = self.collect_categories(&subject) else {
            return Err(self.log_cancelled(request_id, started_at));
        };

        for failure in &failures {
            warn!(
                "event=category_fetch module=service status=error request_id={} category={} error_code=category_fetch_failed cause={} error={}",
                request_id,
                failure.category,
                failure.error.code(),
                failure.error
            );
        }

        info!(
            "event=share_view module=service status=ok request_id={} outcome=completed categories={} records={} failed_categories={} duration_ms={}",
            request_id,
            result.len(),
            result.record_count(),
            failures.len(),
            started_at.elapsed().as_millis()
        );

        Ok(ShareView::Completed(result))
    }

    /// Reads every category for `subject`.
    ///
    /// Returns `None` when the request was cancelled; every other read error
    /// is collected as a [`CategoryFetchFailed`] so the remaining categories
    /// still run.
    fn collect_categories(
        &self,
        subject: &SubjectId,
    ) -> Option<(AggregateResult, Vec<CategoryFetchFailed>)> {
        let mut result = AggregateResult::new();
        let mut failures = Vec::new();

        for category in Category::ALL {
            if self.cancel.is_cancelled() {
                return None;
            }

            match self.categories.fetch_category(subject, category) {
                Ok(records) => {
                    result.insert_non_empty(category, records);
                }
                Err(RepoError::Cancelled) => return None,
                Err(error) => failures.push(CategoryFetchFailed { category, error }),
            }
        }

        Some((result, failures))
    }

    fn log_cancelled(&self, request_id: Uuid, started_at: Instant) -> ShareViewError {
        info!(
            "event=share_view module=service status=cancelled request_id={} duration_ms={}",
            request_id,
            started_at.elapsed().as_millis()
        );
        ShareViewError::Cancelled
    }
}

/// SQLite-backed share view service over one connection.
pub type SqliteShareViewService<'conn> =
    ShareViewService<SqliteShareTokenRepository<'conn>, SqliteCategoryRepository<'conn>>;

/// Wires SQLite repositories with per-read budgets from `config`.
///
/// The token lookup and each category read get their own guard, so a slow
/// category never eats into another's budget.
pub fn sqlite_share_view<'conn>(
    conn: &'conn Connection,
    config: &ShareViewConfig,
    cancel: CancelFlag,
) -> RepoResult<SqliteShareViewService<'conn>> {
    let tokens = SqliteShareTokenRepository::try_new(
        conn,
        QueryGuard::new(config.token_lookup_timeout(), cancel.clone()),
    )?;
    let categories = SqliteCategoryRepository::try_new(
        conn,
        QueryGuard::new(config.category_fetch_timeout(), cancel.clone()),
    )?;
    Ok(ShareViewService::new(tokens, categories).with_cancel_flag(cancel))
}
