//! Error categorization.
//!
//! This module turns `reqwest` errors and non-2xx responses into the
//! [`SourceError`] taxonomy.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;

use super::types::SourceError;
use crate::config::{HTTP_STATUS_TOO_MANY_REQUESTS, MAX_ERROR_MESSAGE_LENGTH};

/// Categorizes a `reqwest::Error` into a [`SourceError`].
///
/// Status-bearing errors become `Upstream`/`RateLimited`, timeouts become
/// `Timeout`, body decode failures become `Malformed`, and everything else
/// (connect, DNS, reset, redirect loops) is a `Transport` failure.
pub fn categorize_reqwest_error(error: &reqwest::Error, timeout: Duration) -> SourceError {
    if let Some(status) = error.status() {
        if status.as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS {
            return SourceError::RateLimited { retry_after: None };
        }
        return SourceError::Upstream {
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    if error.is_timeout() {
        SourceError::Timeout(timeout)
    } else if error.is_decode() {
        SourceError::Malformed(error.to_string())
    } else {
        SourceError::Transport(error_chain_message(error))
    }
}

/// Categorizes a non-2xx response into a [`SourceError`].
///
/// The message is taken from the Google-style JSON error body
/// (`{"error": {"message": ...}}`, or `{"error": "...", "error_description": ...}`
/// for OAuth) when present, otherwise from the raw body.
pub fn categorize_status(status: StatusCode, headers: &HeaderMap, body: &str) -> SourceError {
    if status.as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS {
        return SourceError::RateLimited {
            retry_after: parse_retry_after(headers),
        };
    }

    SourceError::Upstream {
        status: status.as_u16(),
        message: extract_error_message(body).unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                truncate_message(raw)
            }
        }),
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { message: String },
    Code(String),
}

/// Pulls the human-readable message out of an upstream JSON error body.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let message = match (envelope.error, envelope.error_description) {
        (ErrorBody::Detailed { message }, _) => message,
        (ErrorBody::Code(code), Some(description)) => format!("{code}: {description}"),
        (ErrorBody::Code(code), None) => code,
    };
    Some(truncate_message(&message))
}

/// Parses a `Retry-After` header given in seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Truncates a message to `MAX_ERROR_MESSAGE_LENGTH` characters.
pub(crate) fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_LENGTH {
        return message.to_string();
    }
    let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    format!("{truncated}... (truncated)")
}

/// Joins an error and its sources, so "error sending request" carries the
/// underlying connect/DNS cause.
fn error_chain_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
