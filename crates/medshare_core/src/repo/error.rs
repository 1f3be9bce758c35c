//! Repository error model shared by token and category reads.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for share token and record reads.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Stored row cannot be decoded into the domain shape.
    InvalidData(String),
    /// Read exceeded its per-fetch budget and was interrupted.
    TimedOut { timeout_ms: u64 },
    /// Caller abandoned the request while the read was pending.
    Cancelled,
    MissingRequiredTable(&'static str),
}

impl RepoError {
    /// Stable diagnostic code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::InvalidData(_) => "invalid_data",
            Self::TimedOut { .. } => "timed_out",
            Self::Cancelled => "cancelled",
            Self::MissingRequiredTable(_) => "missing_table",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::TimedOut { timeout_ms } => write!(f, "read timed out after {timeout_ms} ms"),
            Self::Cancelled => write!(f, "read cancelled"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_)
            | Self::TimedOut { .. }
            | Self::Cancelled
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
