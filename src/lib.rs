//! seo_dashboard library: multi-source SEO report aggregation
//!
//! This library fans out to independent, unreliable external APIs (Google
//! Analytics UA and GA4, Search Console, PageSpeed Insights, RDAP, SSL Labs,
//! Google Trends, Google News and the site's own homepage), tolerates partial
//! failure per source, and merges everything into one [`AggregatedReport`].
//!
//! # Example
//!
//! ```no_run
//! use seo_dashboard::{generate_site_report, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     pagespeed_api_key: Some("your-api-key".to_string()),
//!     ..Default::default()
//! };
//!
//! let report = generate_site_report(&config, "example.com").await?;
//! println!(
//!     "{} sources: {} succeeded, {} empty, {} failed",
//!     report.summary.total(),
//!     report.summary.succeeded,
//!     report.summary.empty,
//!     report.summary.failed
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod config;
mod credential;
pub mod domain;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod oauth;
pub mod outcome;
mod parse;
pub mod pipeline;
pub mod server;
pub mod sources;

use anyhow::{Context, Result};

// Re-export public API
pub use config::{Cli, Command, Config, Endpoints, LogFormat, LogLevel};
pub use credential::Credential;
pub use domain::{extract_host, SiteTarget, TargetError};
pub use error_handling::{FailureKind, SourceError};
pub use fetch::{ApiClient, RetryPolicy};
pub use outcome::{EntityOutcomes, OutcomeTally, SourceResult};
pub use parse::{SocialMediaLink, SocialPlatform};
pub use pipeline::{AggregatedReport, Pipeline, ReportKind};
pub use sources::{Section, Source, SourceInput, SourceName};

/// Generates the public site report for `target`.
///
/// `target` may be a URL, a bare domain or a Search Console `sc-domain:`
/// identifier. Only an unusable target or HTTP client set-up fail here;
/// every source failure is recorded inside the report.
///
/// # Errors
///
/// - The target cannot be normalized to an `http(s)://host` URL
/// - The HTTP client cannot be built
pub async fn generate_site_report(config: &Config, target: &str) -> Result<AggregatedReport> {
    let target = SiteTarget::parse(target).context("Invalid report target")?;
    let client = ApiClient::from_config(config).context("Failed to initialize HTTP client")?;
    Ok(Pipeline::new(client, config).site_report(&target).await)
}

/// Exchanges an OAuth authorization `code` and generates the account report.
///
/// # Errors
///
/// - OAuth is not configured, or the code exchange fails
/// - The HTTP client cannot be built
pub async fn generate_account_report(config: &Config, code: &str) -> Result<AggregatedReport> {
    let client = ApiClient::from_config(config).context("Failed to initialize HTTP client")?;
    let credential = oauth::exchange_code(&client, config, code)
        .await
        .context("Failed to exchange authorization code")?;
    Ok(Pipeline::new(client, config).account_report(&credential).await)
}
