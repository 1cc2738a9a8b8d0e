//! Error type definitions.
//!
//! This module defines the adapter error taxonomy and the initialization errors
//! used throughout the application.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Coarse classification of an adapter failure.
///
/// This is what ends up in the report next to the failure message, and what
/// the retry loop inspects to decide whether another attempt is worthwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIterMacro)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Upstream answered with a non-2xx status (other than 429)
    UpstreamHttp,
    /// Connection, DNS, reset, or other transport-level failure
    Transport,
    /// Upstream answered 429 Too Many Requests
    RateLimited,
    /// Response body could not be decoded into the expected schema
    MalformedResponse,
    /// A request or a whole source exceeded its time budget
    Timeout,
    /// The adapter itself panicked; caught by the pipeline
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UpstreamHttp => "Upstream HTTP error",
            FailureKind::Transport => "Transport error",
            FailureKind::RateLimited => "Rate limited",
            FailureKind::MalformedResponse => "Malformed response",
            FailureKind::Timeout => "Timeout",
            FailureKind::Internal => "Internal error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single call to an external API.
///
/// Adapters return these as data; they never cross into the pipeline as
/// unguarded errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Non-2xx response, with the upstream's own message when it sent one.
    #[error("HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Connection-level failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 429, optionally with the server's `Retry-After` hint.
    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },

    /// The body did not match the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request (or the whole source) ran out of time.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl SourceError {
    /// The failure kind recorded in the report.
    pub fn kind(&self) -> FailureKind {
        match self {
            SourceError::Upstream { .. } => FailureKind::UpstreamHttp,
            SourceError::Transport(_) => FailureKind::Transport,
            SourceError::RateLimited { .. } => FailureKind::RateLimited,
            SourceError::Malformed(_) => FailureKind::MalformedResponse,
            SourceError::Timeout(_) => FailureKind::Timeout,
        }
    }

    /// HTTP status attached to the failure, if the upstream sent one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SourceError::Upstream { status, .. } => Some(*status),
            SourceError::RateLimited { .. } => {
                Some(crate::config::HTTP_STATUS_TOO_MANY_REQUESTS)
            }
            _ => None,
        }
    }

    /// Whether another attempt might succeed.
    ///
    /// Only transport-level failures (including request timeouts) and 429s
    /// are retried. Every other 4xx/5xx and every decode failure is final.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SourceError::Transport(_) | SourceError::Timeout(_) | SourceError::RateLimited { .. }
        )
    }

    /// Server-provided `Retry-After` hint.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SourceError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
