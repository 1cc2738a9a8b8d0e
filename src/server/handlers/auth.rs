//! OAuth consent and callback handlers.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};

use super::super::render::report_page;
use super::super::types::{CallbackQuery, DashboardError, DashboardState, OutputFormat};
use super::{html_error, json_error, json_report};
use crate::fetch::ApiClient;
use crate::oauth::{authorization_url, exchange_code, OAuthError};
use crate::pipeline::{AggregatedReport, Pipeline};

/// Redirects to the Google consent page
pub async fn auth_handler(State(state): State<DashboardState>) -> Response {
    match authorization_url(&state.config) {
        Ok(url) => Redirect::temporary(url.as_str()).into_response(),
        Err(e) => html_error(&DashboardError::from(e)),
    }
}

/// Exchanges the code and renders the account report
pub async fn callback_handler(
    State(state): State<DashboardState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let result = account_report(&state, &query).await;
    match (query.format, result) {
        (OutputFormat::Html, Ok(report)) => Html(report_page(&report)).into_response(),
        (OutputFormat::Json, Ok(report)) => json_report(&report),
        (OutputFormat::Html, Err(e)) => html_error(&e),
        (OutputFormat::Json, Err(e)) => json_error(&e),
    }
}

async fn account_report(
    state: &DashboardState,
    query: &CallbackQuery,
) -> Result<AggregatedReport, DashboardError> {
    if let Some(error) = &query.error {
        return Err(DashboardError::ConsentDenied(error.clone()));
    }
    let code = query.code.as_deref().ok_or(OAuthError::EmptyCode)?;
    let client = ApiClient::from_config(&state.config)?;
    let credential = exchange_code(&client, &state.config, code).await?;
    Ok(Pipeline::new(client, &state.config)
        .account_report(&credential)
        .await)
}
