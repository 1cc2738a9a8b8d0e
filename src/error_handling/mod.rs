//! Error handling.
//!
//! This module provides:
//! - The adapter error taxonomy ([`SourceError`], [`FailureKind`])
//! - Initialization error types
//! - Categorization of `reqwest` errors and non-2xx responses
//!
//! Adapter errors are data: every adapter converts its failures into a
//! [`SourceError`] and wraps it in a `SourceResult` instead of propagating it.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_status};
pub(crate) use categorization::truncate_message;
pub use types::{FailureKind, InitializationError, SourceError};
