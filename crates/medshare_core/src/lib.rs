//! Core logic for token-scoped sharing of medical records.
//!
//! A share token resolves to one subject; the subject's fixed set of record
//! categories is read and merged into a single read-only view.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod present;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ConfigResult, ShareViewConfig};
pub use logging::{default_log_level, init_logging, redact_token, LogSettings, LoggingError};
pub use model::aggregate::{AggregateResult, ShareView};
pub use model::category::Category;
pub use model::record::{Record, RecordSet};
pub use model::share_token::{InvalidTokenReason, ShareToken, SubjectId};
pub use present::format::{format_record, MISSING_VALUE};
pub use present::summary::{render_summary, SummarySection, SummaryView};
pub use present::view_state::ViewState;
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::guard::{CancelFlag, QueryGuard};
pub use repo::token_repo::{ShareTokenRepository, SqliteShareTokenRepository};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::share_view_service::{
    sqlite_share_view, CategoryFetchFailed, ShareViewError, ShareViewErrorKind, ShareViewService,
    SqliteShareViewService,
};
pub use service::token_service::{LookupError, TokenResolver};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
