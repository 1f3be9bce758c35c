//! Core use-case services.
//!
//! # Responsibility
//! - Resolve share tokens and aggregate category reads into one view.
//! - Keep CLI/presentation layers decoupled from storage details.

pub mod clock;
pub mod share_view_service;
pub mod token_service;
