//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define read-only data access contracts for share tokens and
//!   per-subject record categories.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories never write to the backing store.
//! - Every store read runs under a [`guard::QueryGuard`] budget.
//! - "Not found" and "empty" are values, never errors.

pub mod category_repo;
pub mod error;
pub mod guard;
pub mod token_repo;

use error::{RepoError, RepoResult};
use rusqlite::Connection;

pub(crate) fn ensure_tables_ready(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
