//! Opaque per-category records.
//!
//! Records are field-name to value mappings exactly as stored. Nothing in
//! the core validates their shape; formatting of missing fields belongs to
//! the presentation layer.

use serde_json::{Map, Value};

/// One stored document within a category.
pub type Record = Map<String, Value>;

/// Records of one category for one subject, in storage order.
pub type RecordSet = Vec<Record>;
