//! Google Trends interest over time and rising related queries.
//!
//! The trends endpoints are a two-step protocol: `explore` returns widget
//! tokens, and each widget's data is fetched with its token. Every response
//! carries an anti-XSSI prefix before the JSON body.
//!
//! `explore` answers 429 to clients without the `NID` cookie, so each report
//! first loads the public explore page to collect it.

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Section, Source, SourceInput, SourceName};
use crate::config::TRENDS_TIMEFRAME;
use crate::error_handling::SourceError;
use crate::fetch::{decode_json, ApiClient, RetryPolicy};
use crate::outcome::SourceResult;

const LANGUAGE: &str = "en-US";
const TZ_OFFSET_MINUTES: &str = "360";
const GEO: &str = "US";

/// Search interest for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub keyword: String,
    pub timeframe: String,
    pub interest: Vec<InterestPoint>,
    pub rising: Vec<RisingQuery>,
}

/// Relative popularity (0-100) for the period starting at `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterestPoint {
    pub date: String,
    pub popularity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RisingQuery {
    pub query: String,
    /// Percentage growth
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    token: String,
    request: Value,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: MultilineData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultilineData {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    time: String,
    #[serde(default)]
    value: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct RelatedResponse {
    default: RelatedData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedData {
    #[serde(default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedList {
    #[serde(default)]
    ranked_keyword: Vec<RisingQuery>,
}

/// Drops everything before the first `{`.
fn strip_xssi_prefix(body: &str) -> &str {
    body.find('{').map_or(body, |start| &body[start..])
}

fn decode_trends<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    decode_json(strip_xssi_prefix(body))
}

impl TimelinePoint {
    fn into_interest(self) -> Option<InterestPoint> {
        let seconds: i64 = self.time.parse().ok()?;
        let date = DateTime::from_timestamp(seconds, 0)?
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();
        Some(InterestPoint {
            date,
            popularity: self.value.first().copied().unwrap_or(0),
        })
    }
}

/// Google Trends adapter.
pub struct Trends {
    client: ApiClient,
    policy: RetryPolicy,
}

impl Trends {
    /// `policy` is normally a fixed cooldown: the trends endpoints answer
    /// bursts with 429 and no Retry-After.
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Interest over the last five years plus rising related queries.
    pub async fn keyword_report(&self, keyword: &str) -> SourceResult<TrendReport> {
        log::info!("trends: fetching '{keyword}'");
        match self.fetch(keyword).await {
            Ok(report) if report.interest.is_empty() => {
                SourceResult::empty(format!("no trend data for '{keyword}'"))
            }
            Ok(report) => SourceResult::success(report),
            Err(e) => {
                log::warn!("trends: '{keyword}': {e}");
                e.into()
            }
        }
    }

    async fn fetch(&self, keyword: &str) -> Result<TrendReport, SourceError> {
        self.collect_session_cookie().await;
        let widgets = self.explore(keyword).await?;

        let timeseries = widgets
            .iter()
            .find(|w| w.id == "TIMESERIES")
            .ok_or_else(|| SourceError::Malformed("explore response has no TIMESERIES widget".into()))?;
        let multiline: MultilineResponse = self.widget_data("multiline", timeseries).await?;
        let interest = multiline
            .default
            .timeline_data
            .into_iter()
            .filter_map(TimelinePoint::into_interest)
            .collect();

        // Low-volume keywords get no related queries widget at all.
        let rising = match widgets.iter().find(|w| w.id == "RELATED_QUERIES") {
            Some(widget) => {
                let related: RelatedResponse = self.widget_data("relatedsearches", widget).await?;
                // ranked lists are [top, rising]
                related
                    .default
                    .ranked_list
                    .into_iter()
                    .nth(1)
                    .map(|list| list.ranked_keyword)
                    .unwrap_or_default()
            }
            None => Vec::new(),
        };

        Ok(TrendReport {
            keyword: keyword.to_string(),
            timeframe: TRENDS_TIMEFRAME.to_string(),
            interest,
            rising,
        })
    }

    /// Loads the explore page so the client's cookie store holds `NID`.
    ///
    /// A failure here is not fatal; `explore` reports the real outcome.
    async fn collect_session_cookie(&self) {
        let url = &self.client.endpoints().trends_cookie_page;
        let request = self.client.get(url).query(&[("geo", GEO)]);
        if let Err(e) = self.client.send_text(request).await {
            log::debug!("trends: cookie page unavailable: {e}");
        }
    }

    async fn explore(&self, keyword: &str) -> Result<Vec<Widget>, SourceError> {
        let url = format!("{}/explore", self.client.endpoints().trends);
        let request = json!({
            "comparisonItem": [{"keyword": keyword, "geo": "", "time": TRENDS_TIMEFRAME}],
            "category": 0,
            "property": "",
        })
        .to_string();
        let params = [("hl", LANGUAGE), ("tz", TZ_OFFSET_MINUTES), ("req", request.as_str())];

        let body = self
            .policy
            .execute("trends explore", || {
                self.client.send_text(self.client.get(&url).query(&params))
            })
            .await?;
        let explore: ExploreResponse = decode_trends(&body)?;
        Ok(explore.widgets)
    }

    async fn widget_data<T: serde::de::DeserializeOwned>(
        &self,
        kind: &str,
        widget: &Widget,
    ) -> Result<T, SourceError> {
        let url = format!("{}/widgetdata/{}", self.client.endpoints().trends, kind);
        let request = widget.request.to_string();
        let params = [
            ("hl", LANGUAGE),
            ("tz", TZ_OFFSET_MINUTES),
            ("req", request.as_str()),
            ("token", widget.token.as_str()),
        ];

        let label = format!("trends {kind}");
        let body = self
            .policy
            .execute(&label, || {
                self.client.send_text(self.client.get(&url).query(&params))
            })
            .await?;
        decode_trends(&body)
    }
}

#[async_trait]
impl Source for Trends {
    fn name(&self) -> SourceName {
        SourceName::Trends
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let target = match input.require_target() {
            Ok(target) => target,
            Err(empty) => return empty,
        };
        let keyword = target.domain();
        self.keyword_report(&keyword).await.map(Section::Trends)
    }
}
