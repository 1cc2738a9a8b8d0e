//! Dashboard server state, request parameters and errors.

use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::domain::TargetError;
use crate::error_handling::InitializationError;
use crate::oauth::OAuthError;

/// Shared state for the dashboard server
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub config: Arc<Config>,
}

impl DashboardState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Form body of `POST /process_url`
#[derive(Debug, Deserialize)]
pub struct ProcessUrlForm {
    pub url: String,
}

/// Query of `GET /api/report`
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

/// Query of `GET /callback`
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    /// Set by Google when the user denies consent
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
}

/// JSON body of an error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Why a report could not be produced at all.
///
/// Source failures never end up here: they are part of the report.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    #[error("authorization was not granted: {0}")]
    ConsentDenied(String),

    #[error(transparent)]
    OAuth(#[from] OAuthError),

    #[error("failed to set up HTTP client: {0}")]
    Client(#[from] InitializationError),
}

impl DashboardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::InvalidTarget(_) | DashboardError::ConsentDenied(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::OAuth(OAuthError::NotConfigured(_))
            | DashboardError::OAuth(OAuthError::InvalidEndpoint { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            DashboardError::OAuth(_) => StatusCode::BAD_REQUEST,
            DashboardError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
