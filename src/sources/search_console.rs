//! Search Console (webmasters v3): verified sites and their top queries.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::{Section, Source, SourceInput, SourceName};
use crate::config::{REPORT_WINDOW_DAYS, SEARCH_CONSOLE_ROW_LIMIT};
use crate::credential::Credential;
use crate::domain::{extract_host, SC_DOMAIN_PREFIX};
use crate::error_handling::SourceError;
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::{EntityOutcomes, SourceResult};

/// Top queries for one verified site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSearchData {
    pub site_url: String,
    /// Host extracted from the site URL
    pub domain: String,
    pub start_date: String,
    pub end_date: String,
    pub rows: Vec<QueryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SitesList {
    #[serde(default)]
    site_entry: Vec<SiteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteEntry {
    site_url: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<QueryRow>,
}

/// Whether the site URL is a form the query endpoint accepts.
fn is_queryable(site_url: &str) -> bool {
    site_url.starts_with(SC_DOMAIN_PREFIX)
        || site_url.starts_with("http://")
        || site_url.starts_with("https://")
}

/// Report key for a site: the site URL without its trailing slash.
pub fn site_key(site_url: &str) -> String {
    site_url.trim_end_matches('/').to_string()
}

/// Trailing window ending today (UTC), inclusive.
fn report_window(today: NaiveDate) -> (String, String) {
    let start = today - ChronoDuration::days(REPORT_WINDOW_DAYS);
    (
        start.format("%Y-%m-%d").to_string(),
        today.format("%Y-%m-%d").to_string(),
    )
}

/// `{base}/sites/{site}/searchAnalytics/query` with the site URL as one
/// percent-encoded path segment.
fn query_url(base: &str, site_url: &str) -> Result<Url, SourceError> {
    let mut url = Url::parse(base)
        .map_err(|e| SourceError::Transport(format!("invalid Search Console endpoint: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| SourceError::Transport("Search Console endpoint cannot be a base".into()))?
        .pop_if_empty()
        .push("sites")
        .push(site_url)
        .push("searchAnalytics")
        .push("query");
    Ok(url)
}

/// Search Console adapter.
pub struct SearchConsole {
    client: ApiClient,
    policy: RetryPolicy,
}

impl SearchConsole {
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn sites_report(
        &self,
        credential: &Credential,
    ) -> SourceResult<EntityOutcomes<SiteSearchData>> {
        let url = format!("{}/sites", self.client.endpoints().search_console);
        let sites: Result<SitesList, SourceError> = self
            .policy
            .execute("search_console sites", || {
                self.client.send_json(self.client.get_authorized(&url, credential))
            })
            .await;
        let sites = match sites {
            Ok(list) => list.site_entry,
            Err(e) => {
                log::warn!("search_console: listing sites failed: {e}");
                return e.into();
            }
        };

        let mut keys = HashSet::new();
        let sites: Vec<String> = sites
            .into_iter()
            .map(|entry| entry.site_url)
            .filter(|site_url| {
                if !is_queryable(site_url) {
                    log::debug!("search_console: skipping unsupported site '{site_url}'");
                    return false;
                }
                if !keys.insert(site_key(site_url)) {
                    log::warn!("search_console: skipping '{site_url}', same site as an earlier entry");
                    return false;
                }
                true
            })
            .collect();
        if sites.is_empty() {
            return SourceResult::empty("no sites");
        }
        log::info!("search_console: {} site(s)", sites.len());

        let (start_date, end_date) = report_window(Utc::now().date_naive());
        let outcomes = join_all(
            sites
                .iter()
                .map(|site_url| self.site(credential, site_url, &start_date, &end_date)),
        )
        .await;

        SourceResult::success(
            sites
                .iter()
                .map(|site_url| site_key(site_url))
                .zip(outcomes)
                .collect(),
        )
    }

    async fn site(
        &self,
        credential: &Credential,
        site_url: &str,
        start_date: &str,
        end_date: &str,
    ) -> SourceResult<SiteSearchData> {
        let url = match query_url(&self.client.endpoints().search_console, site_url) {
            Ok(url) => url,
            Err(e) => return e.into(),
        };
        let body = json!({
            "startDate": start_date,
            "endDate": end_date,
            "dimensions": ["query"],
            "rowLimit": SEARCH_CONSOLE_ROW_LIMIT,
        });

        let label = format!("search_console {site_url}");
        let response: Result<QueryResponse, SourceError> = self
            .policy
            .execute(&label, || {
                self.client
                    .send_json(self.client.post_authorized(url.as_str(), credential).json(&body))
            })
            .await;

        response
            .map(|response| SiteSearchData {
                site_url: site_url.to_string(),
                domain: extract_host(site_url),
                start_date: start_date.to_string(),
                end_date: end_date.to_string(),
                rows: response.rows,
            })
            .into()
    }
}

#[async_trait]
impl Source for SearchConsole {
    fn name(&self) -> SourceName {
        SourceName::SearchConsole
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let credential = match input.require_credential() {
            Ok(credential) => credential,
            Err(empty) => return empty,
        };
        self.sites_report(credential).await.map(Section::SearchConsole)
    }
}
