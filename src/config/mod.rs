//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, retry bounds, upstream limits)
//! - Upstream endpoint base URLs
//! - CLI option types and parsing

mod constants;
mod endpoints;
mod types;

// Re-export all constants
pub use constants::*;
pub use endpoints::Endpoints;
pub use types::{Cli, Command, Config, LogFormat, LogLevel};
