//! Dashboard HTTP handlers.

mod auth;
mod report;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use super::render::error_page;
use super::types::{DashboardError, ErrorResponse};

pub use auth::{auth_handler, callback_handler};
pub use report::{api_report_handler, home_handler, process_url_handler};

fn html_error(error: &DashboardError) -> Response {
    log::warn!("request failed: {error}");
    (error.status_code(), Html(error_page(&error.to_string()))).into_response()
}

fn json_error(error: &DashboardError) -> Response {
    log::warn!("request failed: {error}");
    (
        error.status_code(),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn json_report<T: serde::Serialize>(report: &T) -> Response {
    match serde_json::to_value(report) {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("failed to serialize report: {e}"),
            }),
        )
            .into_response(),
    }
}
