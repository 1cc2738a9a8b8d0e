//! Site report handlers.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;

use super::super::render::{home_page, report_page};
use super::super::types::{DashboardError, DashboardState, ProcessUrlForm, ReportQuery};
use super::{html_error, json_error, json_report};
use crate::domain::SiteTarget;
use crate::fetch::ApiClient;
use crate::pipeline::{AggregatedReport, Pipeline};

/// Landing page with the site form
pub async fn home_handler() -> Html<String> {
    Html(home_page())
}

/// HTML site report for the submitted URL
pub async fn process_url_handler(
    State(state): State<DashboardState>,
    Form(form): Form<ProcessUrlForm>,
) -> Response {
    match site_report(&state, &form.url).await {
        Ok(report) => Html(report_page(&report)).into_response(),
        Err(e) => html_error(&e),
    }
}

/// JSON site report for `?url=`
pub async fn api_report_handler(
    State(state): State<DashboardState>,
    Query(query): Query<ReportQuery>,
) -> Response {
    match site_report(&state, &query.url).await {
        Ok(report) => json_report(&report),
        Err(e) => json_error(&e),
    }
}

async fn site_report(
    state: &DashboardState,
    raw_target: &str,
) -> Result<AggregatedReport, DashboardError> {
    let target = SiteTarget::parse(raw_target)?;
    let client = ApiClient::from_config(&state.config)?;
    Ok(Pipeline::new(client, &state.config).site_report(&target).await)
}
