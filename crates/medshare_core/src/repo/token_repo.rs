//! Share token lookup contract and SQLite implementation.
//!
//! # Responsibility
//! - Look up one token record keyed by the exact token value.
//!
//! # Invariants
//! - Lookup is read-only and returns `Ok(None)` for unknown tokens.
//! - Transport failures are errors, never "not found".

use crate::model::share_token::{ShareToken, SubjectId};
use crate::repo::ensure_tables_ready;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::guard::QueryGuard;
use rusqlite::{Connection, OptionalExtension, Row};

/// Read contract over the share token store.
pub trait ShareTokenRepository {
    /// Finds the token record stored under `token`.
    fn find_share_token(&self, token: &str) -> RepoResult<Option<ShareToken>>;
}

/// SQLite-backed share token repository.
pub struct SqliteShareTokenRepository<'conn> {
    conn: &'conn Connection,
    guard: QueryGuard,
}

impl<'conn> SqliteShareTokenRepository<'conn> {
    /// Creates repository from a connection at the latest schema version.
    pub fn try_new(conn: &'conn Connection, guard: QueryGuard) -> RepoResult<Self> {
        ensure_tables_ready(conn, &["share_tokens"])?;
        Ok(Self { conn, guard })
    }
}

impl ShareTokenRepository for SqliteShareTokenRepository<'_> {
    fn find_share_token(&self, token: &str) -> RepoResult<Option<ShareToken>> {
        self.guard.run(self.conn, |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT
                    token,
                    subject_id,
                    issued_at,
                    expires_at
                 FROM share_tokens
                 WHERE token = ?1;",
            )?;
            let row = stmt
                .query_row([token], |row| Ok(parse_token_row(row)))
                .optional()?;
            row.transpose()
        })
    }
}

fn parse_token_row(row: &Row<'_>) -> RepoResult<ShareToken> {
    let subject_text: String = row.get("subject_id")?;
    if subject_text.trim().is_empty() {
        return Err(RepoError::InvalidData(
            "empty subject_id in share_tokens.subject_id".to_string(),
        ));
    }

    Ok(ShareToken {
        token: row.get("token")?,
        subject_id: SubjectId::new(subject_text),
        issued_at_ms: row.get("issued_at")?,
        expires_at_ms: row.get("expires_at")?,
    })
}

impl<R: ShareTokenRepository + ?Sized> ShareTokenRepository for &R {
    fn find_share_token(&self, token: &str) -> RepoResult<Option<ShareToken>> {
        (**self).find_share_token(token)
    }
}
