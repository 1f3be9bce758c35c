//! Presentation adapter for aggregated share views.
//!
//! # Responsibility
//! - Turn an [`crate::AggregateResult`] into per-category display lines.
//! - Own request-scoped view state (pending / ready / failed).
//!
//! # Invariants
//! - Absent categories render as "section not shown", never as errors.
//! - Records are formatted leniently; a missing field shows a placeholder.

pub mod format;
pub mod summary;
pub mod view_state;
