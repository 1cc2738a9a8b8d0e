//! Dashboard web server.
//!
//! Routes:
//! - `GET /` - landing page with the site form
//! - `POST /process_url` - HTML site report
//! - `GET /api/report?url=` - JSON site report
//! - `GET /auth` - redirect to the Google consent page
//! - `GET /callback?code=&format=html|json` - account report
//!
//! A report is always served with 200, whatever its sources did. Only an
//! unusable target or a failed sign-in produce an error status.

mod handlers;
mod render;
mod types;

use axum::routing::{get, post};
use axum::Router;

use crate::config::Config;
use handlers::{
    api_report_handler, auth_handler, callback_handler, home_handler, process_url_handler,
};

pub use render::escape_html;
pub use types::{DashboardError, DashboardState, OutputFormat};

/// Builds the dashboard router
pub fn build_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/process_url", post(process_url_handler))
        .route("/api/report", get(api_report_handler))
        .route("/auth", get(auth_handler))
        .route("/callback", get(callback_handler))
        .with_state(state)
}

/// Binds to `127.0.0.1:port` and serves until the process exits
pub async fn serve(config: Config, port: u16) -> Result<(), anyhow::Error> {
    let app = build_router(DashboardState::new(config));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}"))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind dashboard to port {port}: {e}"))?;

    log::info!("Dashboard listening on http://127.0.0.1:{port}/");
    log::info!("  - Site report: http://127.0.0.1:{port}/api/report?url=example.com");
    log::info!("  - Sign in: http://127.0.0.1:{port}/auth");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Dashboard server error: {e}"))?;

    Ok(())
}
