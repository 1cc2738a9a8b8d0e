//! Google Analytics 4 (Admin API discovery, Data API reports).
//!
//! A single `runReport` call accepts a limited number of dimensions and
//! metrics, so each property is queried with a fixed set of batches issued
//! concurrently. Once every batch has answered, the responses are merged into
//! one [`MergedMetricSet`]. If any batch fails the whole property is a failure:
//! a partial merge would misrepresent what the property reported.

mod merge;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub use merge::{merge_batches, BatchReport, MergedMetricSet, MetricHeader, ReportRow};

use super::{Section, Source, SourceInput, SourceName};
use crate::config::{GA4_MAX_DIMENSIONS_PER_REQUEST, GA4_MAX_LIST_PAGES, GA4_MAX_METRICS_PER_REQUEST};
use crate::credential::Credential;
use crate::error_handling::SourceError;
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::{EntityOutcomes, SourceResult};

/// One `runReport` request's share of the dimension/metric wishlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportBatch {
    pub dimensions: &'static [&'static str],
    pub metrics: &'static [&'static str],
}

const GA4_METRICS: &[&str] = &[
    "activeUsers",
    "newUsers",
    "sessions",
    "screenPageViews",
    "engagementRate",
    "bounceRate",
    "averageSessionDuration",
    "eventCount",
];

/// The wishlist split by dimension; every batch carries the same metrics.
pub const DEFAULT_BATCHES: &[ReportBatch] = &[
    ReportBatch {
        dimensions: &["date"],
        metrics: GA4_METRICS,
    },
    ReportBatch {
        dimensions: &["country"],
        metrics: GA4_METRICS,
    },
    ReportBatch {
        dimensions: &["deviceCategory"],
        metrics: GA4_METRICS,
    },
    ReportBatch {
        dimensions: &["sessionSource", "sessionMedium"],
        metrics: GA4_METRICS,
    },
];

impl ReportBatch {
    /// Whether the upstream per-request limits accept this batch.
    pub fn within_limits(&self) -> bool {
        !self.metrics.is_empty()
            && self.dimensions.len() <= GA4_MAX_DIMENSIONS_PER_REQUEST
            && self.metrics.len() <= GA4_MAX_METRICS_PER_REQUEST
    }

    fn request_body(&self) -> serde_json::Value {
        json!({
            "dateRanges": [{"startDate": "30daysAgo", "endDate": "today"}],
            "dimensions": self.dimensions.iter().map(|name| json!({"name": name})).collect::<Vec<_>>(),
            "metrics": self.metrics.iter().map(|name| json!({"name": name})).collect::<Vec<_>>(),
            "metricAggregations": ["TOTAL", "MAXIMUM", "MINIMUM"],
        })
    }
}

/// Strips a resource prefix: `properties/123` → `123`.
///
/// Identifiers without the prefix are returned unchanged.
pub fn strip_resource_prefix<'a>(name: &'a str, collection: &str) -> &'a str {
    name.strip_prefix(collection)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ga4Account {
    pub display_name: String,
    pub properties: EntityOutcomes<Ga4Property>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ga4Property {
    pub display_name: String,
    pub report: MergedMetricSet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminResource {
    name: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountsPage {
    #[serde(default)]
    accounts: Vec<AdminResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertiesPage {
    #[serde(default)]
    properties: Vec<AdminResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// GA4 adapter.
pub struct Ga4Analytics {
    client: ApiClient,
    policy: RetryPolicy,
    batches: &'static [ReportBatch],
}

impl Ga4Analytics {
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            batches: DEFAULT_BATCHES,
        }
    }

    /// Discovers every account and property and reports on each property.
    pub async fn discover(&self, credential: &Credential) -> SourceResult<EntityOutcomes<Ga4Account>> {
        let accounts = match self.list_accounts(credential).await {
            Ok(accounts) => accounts,
            Err(e) => {
                log::warn!("analytics_ga4: listing accounts failed: {e}");
                return e.into();
            }
        };
        if accounts.is_empty() {
            log::info!("analytics_ga4: no accounts");
            return SourceResult::empty("no accounts");
        }
        log::info!("analytics_ga4: {} account(s)", accounts.len());

        let outcomes = join_all(accounts.iter().map(|account| self.account(credential, account))).await;

        SourceResult::success(
            accounts
                .iter()
                .map(|account| strip_resource_prefix(&account.name, "accounts").to_string())
                .zip(outcomes)
                .collect(),
        )
    }

    async fn account(&self, credential: &Credential, account: &AdminResource) -> SourceResult<Ga4Account> {
        let properties = match self.list_properties(credential, &account.name).await {
            Ok(properties) => properties,
            Err(e) => {
                log::warn!("analytics_ga4: {}: {e}", account.name);
                return e.into();
            }
        };
        if properties.is_empty() {
            return SourceResult::empty("no properties");
        }

        let outcomes = join_all(
            properties
                .iter()
                .map(|property| self.property_report(credential, &property.name)),
        )
        .await;

        SourceResult::success(Ga4Account {
            display_name: account.display_name.clone(),
            properties: properties
                .iter()
                .zip(outcomes)
                .map(|(property, outcome)| {
                    let outcome = outcome.map(|report| Ga4Property {
                        display_name: property.display_name.clone(),
                        report,
                    });
                    (
                        strip_resource_prefix(&property.name, "properties").to_string(),
                        outcome,
                    )
                })
                .collect(),
        })
    }

    /// Runs every batch for one property concurrently and merges the results.
    pub async fn property_report(
        &self,
        credential: &Credential,
        property: &str,
    ) -> SourceResult<MergedMetricSet> {
        let property_id = strip_resource_prefix(property, "properties");
        let url = format!(
            "{}/properties/{}:runReport",
            self.client.endpoints().analytics_reporting,
            property_id
        );

        let responses = join_all(
            self.batches
                .iter()
                .map(|batch| self.run_batch(credential, &url, property_id, batch)),
        )
        .await;

        let mut reports = Vec::with_capacity(responses.len());
        for (index, response) in responses.into_iter().enumerate() {
            match response {
                Ok(report) => reports.push(report),
                Err(e) => {
                    log::warn!(
                        "analytics_ga4: property {property_id} batch {} of {} failed: {e}",
                        index + 1,
                        self.batches.len()
                    );
                    return e.into();
                }
            }
        }
        SourceResult::success(merge_batches(reports))
    }

    async fn run_batch(
        &self,
        credential: &Credential,
        url: &str,
        property_id: &str,
        batch: &ReportBatch,
    ) -> Result<BatchReport, SourceError> {
        let body = batch.request_body();
        let label = format!("analytics_ga4 property {property_id} [{}]", batch.dimensions.join(","));
        self.policy
            .execute(&label, || {
                self.client
                    .send_json(self.client.post_authorized(url, credential).json(&body))
            })
            .await
    }

    async fn list_accounts(&self, credential: &Credential) -> Result<Vec<AdminResource>, SourceError> {
        let url = format!("{}/accounts", self.client.endpoints().analytics_admin);
        let mut accounts = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..GA4_MAX_LIST_PAGES {
            let page: AccountsPage = self
                .policy
                .execute("analytics_ga4 accounts", || {
                    let mut request = self
                        .client
                        .get_authorized(&url, credential)
                        .query(&[("pageSize", "200")]);
                    if let Some(token) = &page_token {
                        request = request.query(&[("pageToken", token)]);
                    }
                    self.client.send_json(request)
                })
                .await?;
            accounts.extend(page.accounts);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) if page_token.as_ref() != Some(&token) => page_token = Some(token),
                _ => return Ok(accounts),
            }
        }
        log::warn!("analytics_ga4: account listing truncated after {GA4_MAX_LIST_PAGES} pages");
        Ok(accounts)
    }

    async fn list_properties(
        &self,
        credential: &Credential,
        account: &str,
    ) -> Result<Vec<AdminResource>, SourceError> {
        let url = format!("{}/properties", self.client.endpoints().analytics_admin);
        let filter = format!("parent:{account}");
        let label = format!("analytics_ga4 properties of {account}");
        let mut properties = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..GA4_MAX_LIST_PAGES {
            let page: PropertiesPage = self
                .policy
                .execute(&label, || {
                    let mut request = self
                        .client
                        .get_authorized(&url, credential)
                        .query(&[("filter", filter.as_str()), ("pageSize", "200")]);
                    if let Some(token) = &page_token {
                        request = request.query(&[("pageToken", token)]);
                    }
                    self.client.send_json(request)
                })
                .await?;
            properties.extend(page.properties);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) if page_token.as_ref() != Some(&token) => page_token = Some(token),
                _ => return Ok(properties),
            }
        }
        log::warn!("analytics_ga4: property listing for {account} truncated after {GA4_MAX_LIST_PAGES} pages");
        Ok(properties)
    }
}

#[async_trait]
impl Source for Ga4Analytics {
    fn name(&self) -> SourceName {
        SourceName::AnalyticsGa4
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let credential = match input.require_credential() {
            Ok(credential) => credential,
            Err(empty) => return empty,
        };
        self.discover(credential).await.map(Section::AnalyticsGa4)
    }
}
