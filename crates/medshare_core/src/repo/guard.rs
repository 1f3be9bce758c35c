//! Per-read time budget and cancellation for SQLite statements.
//!
//! # Responsibility
//! - Bound every store read by its own deadline.
//! - Let the caller abandon a request while a statement is running.
//!
//! # Invariants
//! - The progress handler is removed and the connection's busy timeout is
//!   restored before `run` returns.
//! - Budgets are capped at `MAX_TIMEOUT_MS`.
//! - An interrupted statement maps to `Cancelled` when the flag is raised,
//!   otherwise to `TimedOut`.

use crate::config::MAX_TIMEOUT_MS;
use crate::db::DbError;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{Connection, ErrorCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// SQLite VM instructions between deadline checks.
const PROGRESS_CHECK_INTERVAL_OPS: i32 = 1_000;

/// Shared abandon signal for one request.
///
/// Clones observe the same flag; raising it is irreversible.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Time budget plus cancel flag applied to a single store read.
#[derive(Debug, Clone)]
pub struct QueryGuard {
    timeout: Duration,
    cancel: CancelFlag,
}

impl QueryGuard {
    pub fn new(timeout: Duration, cancel: CancelFlag) -> Self {
        Self {
            timeout: timeout.min(Duration::from_millis(MAX_TIMEOUT_MS)),
            cancel,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Runs `read` with a fresh deadline.
    ///
    /// The deadline starts when this call starts, so consecutive reads each
    /// get the full budget. Lock waits use the same budget; the connection's
    /// previous busy timeout is put back afterwards.
    pub fn run<T>(
        &self,
        conn: &Connection,
        read: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        if self.cancel.is_cancelled() {
            return Err(RepoError::Cancelled);
        }

        let deadline = Instant::now() + self.timeout;
        let cancel = self.cancel.clone();
        let previous_busy_timeout = busy_timeout(conn)?;
        conn.busy_timeout(self.timeout)?;
        conn.progress_handler(
            PROGRESS_CHECK_INTERVAL_OPS,
            Some(move || cancel.is_cancelled() || Instant::now() >= deadline),
        );

        let result = read(conn);
        conn.progress_handler(0, None::<fn() -> bool>);
        let restored = conn.busy_timeout(previous_busy_timeout);

        let value = match result {
            Err(err) if is_interrupted(&err) => {
                if self.cancel.is_cancelled() {
                    Err(RepoError::Cancelled)
                } else {
                    Err(RepoError::TimedOut {
                        timeout_ms: duration_ms(self.timeout),
                    })
                }
            }
            other => other,
        }?;
        restored?;
        Ok(value)
    }
}

fn busy_timeout(conn: &Connection) -> RepoResult<Duration> {
    let millis: i64 = conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))?;
    Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
}

fn is_interrupted(err: &RepoError) -> bool {
    matches!(
        err,
        RepoError::Db(DbError::Sqlite(inner))
            if inner.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
    )
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{CancelFlag, QueryGuard};
    use crate::config::MAX_TIMEOUT_MS;
    use crate::repo::error::RepoError;
    use rusqlite::Connection;
    use std::thread;
    use std::time::Duration;

    const ENDLESS_QUERY: &str = "WITH RECURSIVE counter(x) AS (
            SELECT 1
            UNION ALL
            SELECT x + 1 FROM counter
        )
        SELECT count(*) FROM counter;";

    fn run_endless(conn: &Connection, guard: &QueryGuard) -> Result<i64, RepoError> {
        guard.run(conn, |conn| {
            Ok(conn.query_row(ENDLESS_QUERY, [], |row| row.get::<_, i64>(0))?)
        })
    }

    #[test]
    fn fast_read_completes_within_budget() {
        let conn = Connection::open_in_memory().unwrap();
        let guard = QueryGuard::new(Duration::from_secs(5), CancelFlag::new());
        let value = guard
            .run(&conn, |conn| {
                Ok(conn.query_row("SELECT 42;", [], |row| row.get::<_, i64>(0))?)
            })
            .unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn slow_read_is_interrupted_as_timeout() {
        let conn = Connection::open_in_memory().unwrap();
        let guard = QueryGuard::new(Duration::from_millis(50), CancelFlag::new());
        let err = run_endless(&conn, &guard).unwrap_err();
        assert!(matches!(err, RepoError::TimedOut { timeout_ms: 50 }));

        // handler is cleared, so the connection stays usable
        let value: i64 = conn.query_row("SELECT 1;", [], |row| row.get(0)).unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn read_restores_connection_busy_timeout() {
        let conn = Connection::open_in_memory().unwrap();
        conn.busy_timeout(Duration::from_millis(1_234)).unwrap();
        let guard = QueryGuard::new(Duration::from_millis(50), CancelFlag::new());

        run_endless(&conn, &guard).unwrap_err();
        guard.run(&conn, |_| Ok(())).unwrap();

        let millis: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(millis, 1_234);
    }

    #[test]
    fn oversized_budget_is_capped_to_sqlite_range() {
        let conn = Connection::open_in_memory().unwrap();
        let guard = QueryGuard::new(Duration::from_millis(3_000_000_000), CancelFlag::new());
        assert_eq!(guard.timeout(), Duration::from_millis(MAX_TIMEOUT_MS));

        let value = guard
            .run(&conn, |conn| {
                Ok(conn.query_row("SELECT 7;", [], |row| row.get::<_, i64>(0))?)
            })
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn raised_flag_skips_the_read_entirely() {
        let conn = Connection::open_in_memory().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let guard = QueryGuard::new(Duration::from_secs(5), cancel);

        let mut invoked = false;
        let err = guard
            .run(&conn, |_| {
                invoked = true;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, RepoError::Cancelled));
        assert!(!invoked);
    }

    #[test]
    fn flag_raised_mid_read_interrupts_as_cancelled() {
        let conn = Connection::open_in_memory().unwrap();
        let cancel = CancelFlag::new();
        let guard = QueryGuard::new(Duration::from_secs(30), cancel.clone());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            cancel.cancel();
        });
        let err = run_endless(&conn, &guard).unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, RepoError::Cancelled));
    }
}
