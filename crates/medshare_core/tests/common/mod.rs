#![allow(dead_code)]

use medshare_core::{Category, Record};
use rusqlite::{params, Connection};
use serde_json::Value;

pub fn insert_token(conn: &Connection, token: &str, subject_id: &str) {
    insert_token_with_window(conn, token, subject_id, None, None);
}

pub fn insert_token_with_window(
    conn: &Connection,
    token: &str,
    subject_id: &str,
    issued_at: Option<i64>,
    expires_at: Option<i64>,
) {
    conn.execute(
        "INSERT INTO share_tokens (token, subject_id, issued_at, expires_at)
         VALUES (?1, ?2, ?3, ?4);",
        params![token, subject_id, issued_at, expires_at],
    )
    .unwrap();
}

pub fn insert_record(conn: &Connection, subject_id: &str, category: Category, body: Value) {
    insert_raw_record(conn, subject_id, category.as_str(), &body.to_string());
}

pub fn insert_raw_record(conn: &Connection, subject_id: &str, category: &str, body: &str) {
    conn.execute(
        "INSERT INTO subject_records (subject_id, category, body) VALUES (?1, ?2, ?3);",
        params![subject_id, category, body],
    )
    .unwrap();
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("record fixtures are objects")
}
