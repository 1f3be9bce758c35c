//! Domain model for token-scoped record sharing.
//!
//! # Responsibility
//! - Define the fixed record category set and its wire names.
//! - Define share token, subject and aggregate view shapes.
//!
//! # Invariants
//! - The category list is closed; adding or removing one changes the
//!   aggregation surface.
//! - An aggregate never holds a category with an empty record set.

pub mod aggregate;
pub mod category;
pub mod record;
pub mod share_token;
