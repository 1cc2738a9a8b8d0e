//! Universal Analytics (v3 management and core reporting APIs).
//!
//! Discovery walks accounts → web properties → views (profiles) and queries
//! every view. Each level is isolated: one account failing to list its
//! properties does not stop its siblings from being reported.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::{Section, Source, SourceInput, SourceName};
use crate::credential::Credential;
use crate::error_handling::SourceError;
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::{EntityOutcomes, SourceResult};

/// Metrics requested for every view.
pub const UA_METRICS: &str = "ga:sessions,ga:users,ga:pageviews,ga:bounceRate";
/// Dimension requested for every view.
pub const UA_DIMENSIONS: &str = "ga:date";
const UA_START_DATE: &str = "30daysAgo";
const UA_END_DATE: &str = "today";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountAnalytics {
    pub name: String,
    pub properties: EntityOutcomes<PropertyAnalytics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyAnalytics {
    pub name: String,
    pub website_url: Option<String>,
    pub views: EntityOutcomes<ViewMetrics>,
}

/// Core reporting result for one view over the trailing 30 days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewMetrics {
    pub name: String,
    pub column_headers: Vec<String>,
    /// Metric name → total over the window, as reported (string-encoded)
    pub totals: BTreeMap<String, String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ManagementList {
    #[serde(default)]
    items: Vec<ManagementItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagementItem {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    website_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoreReport {
    #[serde(default)]
    column_headers: Vec<ColumnHeader>,
    #[serde(default)]
    totals_for_all_results: BTreeMap<String, String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ColumnHeader {
    name: String,
}

/// Universal Analytics adapter.
pub struct UniversalAnalytics {
    client: ApiClient,
    policy: RetryPolicy,
}

impl UniversalAnalytics {
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Discovers every account and reports on every view beneath it.
    pub async fn discover(
        &self,
        credential: &Credential,
    ) -> SourceResult<EntityOutcomes<AccountAnalytics>> {
        let url = format!("{}/accounts", self.client.endpoints().analytics_management);
        let accounts = match self.list(credential, &url, "analytics accounts").await {
            Ok(accounts) => accounts,
            Err(e) => {
                log::warn!("analytics: listing accounts failed: {e}");
                return e.into();
            }
        };
        if accounts.is_empty() {
            log::info!("analytics: no accounts");
            return SourceResult::empty("no accounts");
        }
        log::info!("analytics: {} account(s)", accounts.len());

        let outcomes = join_all(
            accounts
                .iter()
                .map(|account| self.account(credential, account)),
        )
        .await;

        SourceResult::success(
            accounts
                .into_iter()
                .map(|account| account.id)
                .zip(outcomes)
                .collect(),
        )
    }

    async fn account(
        &self,
        credential: &Credential,
        account: &ManagementItem,
    ) -> SourceResult<AccountAnalytics> {
        let url = format!(
            "{}/accounts/{}/webproperties",
            self.client.endpoints().analytics_management,
            account.id
        );
        let properties = match self
            .list(credential, &url, &format!("analytics account {}", account.id))
            .await
        {
            Ok(properties) => properties,
            Err(e) => {
                log::warn!("analytics: account {}: {e}", account.id);
                return e.into();
            }
        };
        if properties.is_empty() {
            return SourceResult::empty("no properties");
        }

        let outcomes = join_all(
            properties
                .iter()
                .map(|property| self.property(credential, &account.id, property)),
        )
        .await;

        SourceResult::success(AccountAnalytics {
            name: account.name.clone(),
            properties: properties
                .into_iter()
                .map(|property| property.id)
                .zip(outcomes)
                .collect(),
        })
    }

    async fn property(
        &self,
        credential: &Credential,
        account_id: &str,
        property: &ManagementItem,
    ) -> SourceResult<PropertyAnalytics> {
        let url = format!(
            "{}/accounts/{}/webproperties/{}/profiles",
            self.client.endpoints().analytics_management,
            account_id,
            property.id
        );
        let views = match self
            .list(credential, &url, &format!("analytics property {}", property.id))
            .await
        {
            Ok(views) => views,
            Err(e) => {
                log::warn!("analytics: property {}: {e}", property.id);
                return e.into();
            }
        };
        if views.is_empty() {
            return SourceResult::empty("no views");
        }

        let outcomes = join_all(views.iter().map(|view| self.view(credential, view))).await;

        SourceResult::success(PropertyAnalytics {
            name: property.name.clone(),
            website_url: property.website_url.clone(),
            views: views.into_iter().map(|view| view.id).zip(outcomes).collect(),
        })
    }

    async fn view(&self, credential: &Credential, view: &ManagementItem) -> SourceResult<ViewMetrics> {
        let ids = format!("ga:{}", view.id);
        let label = format!("analytics view {}", view.id);
        let report: Result<CoreReport, SourceError> = self
            .policy
            .execute(&label, || {
                self.client.send_json(
                    self.client
                        .get_authorized(&self.client.endpoints().analytics_data, credential)
                        .query(&[
                            ("ids", ids.as_str()),
                            ("start-date", UA_START_DATE),
                            ("end-date", UA_END_DATE),
                            ("metrics", UA_METRICS),
                            ("dimensions", UA_DIMENSIONS),
                        ]),
                )
            })
            .await;

        report
            .map(|report| ViewMetrics {
                name: view.name.clone(),
                column_headers: report.column_headers.into_iter().map(|h| h.name).collect(),
                totals: report.totals_for_all_results,
                rows: report.rows,
            })
            .into()
    }

    async fn list(
        &self,
        credential: &Credential,
        url: &str,
        label: &str,
    ) -> Result<Vec<ManagementItem>, SourceError> {
        let list: ManagementList = self
            .policy
            .execute(label, || {
                self.client
                    .send_json(self.client.get_authorized(url, credential))
            })
            .await?;
        Ok(list.items)
    }
}

#[async_trait]
impl Source for UniversalAnalytics {
    fn name(&self) -> SourceName {
        SourceName::Analytics
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let credential = match input.require_credential() {
            Ok(credential) => credential,
            Err(empty) => return empty,
        };
        self.discover(credential).await.map(Section::Analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_management_list_without_items_is_empty() {
        let list: ManagementList = serde_json::from_str(r#"{"kind": "analytics#accounts", "totalResults": 0}"#).unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_core_report_schema() {
        let report: CoreReport = serde_json::from_str(
            r#"{
                "columnHeaders": [
                    {"name": "ga:date", "columnType": "DIMENSION", "dataType": "STRING"},
                    {"name": "ga:sessions", "columnType": "METRIC", "dataType": "INTEGER"}
                ],
                "totalsForAllResults": {"ga:sessions": "42"},
                "rows": [["20240101", "40"], ["20240102", "2"]]
            }"#,
        )
        .unwrap();
        assert_eq!(report.column_headers.len(), 2);
        assert_eq!(report.totals_for_all_results["ga:sessions"], "42");
        assert_eq!(report.rows[1], vec!["20240102", "2"]);
    }

    #[test]
    fn test_core_report_without_rows() {
        let report: CoreReport = serde_json::from_str(r#"{"totalsForAllResults": {}}"#).unwrap();
        assert!(report.rows.is_empty());
    }
}
