//! Per-subject category reads over `subject_records`.
//!
//! # Responsibility
//! - Read every record under one (subject, category) partition.
//!
//! # Invariants
//! - Records come back in insertion order (`id ASC`); no other sorting.
//! - An empty partition is an empty set, not an error.
//! - Stored bodies must be JSON objects; anything else is `InvalidData`.

use crate::model::category::Category;
use crate::model::record::{Record, RecordSet};
use crate::model::share_token::SubjectId;
use crate::repo::ensure_tables_ready;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::guard::QueryGuard;
use rusqlite::{params, Connection};
use serde_json::Value;

/// Read contract over category partitions.
pub trait CategoryRepository {
    /// Returns all records of `category` owned by `subject`.
    fn fetch_category(&self, subject: &SubjectId, category: Category) -> RepoResult<RecordSet>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
    guard: QueryGuard,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates repository from a connection at the latest schema version.
    pub fn try_new(conn: &'conn Connection, guard: QueryGuard) -> RepoResult<Self> {
        ensure_tables_ready(conn, &["subject_records"])?;
        Ok(Self { conn, guard })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn fetch_category(&self, subject: &SubjectId, category: Category) -> RepoResult<RecordSet> {
        self.guard.run(self.conn, |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, body
                 FROM subject_records
                 WHERE subject_id = ?1
                   AND category = ?2
                 ORDER BY id ASC;",
            )?;
            let mut rows = stmt.query(params![subject.as_str(), category.as_str()])?;
            let mut records = Vec::new();

            while let Some(row) = rows.next()? {
                let id: i64 = row.get("id")?;
                let body: String = row.get("body")?;
                records.push(parse_record_body(id, &body)?);
            }

            Ok(records)
        })
    }
}

impl<R: CategoryRepository + ?Sized> CategoryRepository for &R {
    fn fetch_category(&self, subject: &SubjectId, category: Category) -> RepoResult<RecordSet> {
        (**self).fetch_category(subject, category)
    }
}

fn parse_record_body(id: i64, body: &str) -> RepoResult<Record> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(RepoError::InvalidData(format!(
            "subject_records.body for id {id} is not a JSON object"
        ))),
        Err(err) => Err(RepoError::InvalidData(format!(
            "subject_records.body for id {id} is not valid JSON: {err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_record_body;
    use crate::repo::error::RepoError;

    #[test]
    fn object_bodies_pass_through_unchanged() {
        let record = parse_record_body(1, r#"{"level": 5.4, "note": null}"#).unwrap();
        assert_eq!(record.len(), 2);
        assert!(record["note"].is_null());
    }

    #[test]
    fn non_object_bodies_are_invalid_data() {
        for body in ["[1, 2]", "\"text\"", "{broken"] {
            let err = parse_record_body(7, body).unwrap_err();
            assert!(matches!(err, RepoError::InvalidData(message) if message.contains("id 7")));
        }
    }
}
