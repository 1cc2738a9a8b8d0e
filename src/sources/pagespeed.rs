//! PageSpeed Insights (Lighthouse) audits.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Section, Source, SourceInput, SourceName};
use crate::domain::SiteTarget;
use crate::error_handling::SourceError;
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::SourceResult;

const CATEGORIES: &[&str] = &["performance", "accessibility", "best-practices", "seo"];

/// Audit ids and weights for the core web vitals score.
const VITAL_WEIGHTS: &[(&str, f64)] = &[
    ("first-contentful-paint", 0.10),
    ("speed-index", 0.10),
    ("largest-contentful-paint", 0.25),
    ("total-blocking-time", 0.30),
    ("cumulative-layout-shift", 0.25),
];

/// Reshaped Lighthouse result for one URL (desktop strategy).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LighthouseReport {
    pub url: String,
    pub final_url: Option<String>,
    /// Category scores on a 0-100 scale, rounded to 2 decimals
    pub performance_score: Option<f64>,
    pub accessibility_score: Option<f64>,
    pub best_practices_score: Option<f64>,
    pub seo_score: Option<f64>,
    pub core_web_vitals: CoreWebVitals,
    /// Weighted score over the vitals' audit scores, 0-100
    pub vitals_score: Option<f64>,
    /// `data:image/...;base64,...` of the rendered page
    pub final_screenshot: Option<String>,
}

/// Timings in seconds; CLS is unitless.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoreWebVitals {
    pub first_contentful_paint: Option<f64>,
    pub speed_index: Option<f64>,
    pub largest_contentful_paint: Option<f64>,
    pub total_blocking_time: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LighthouseResult {
    #[serde(default)]
    final_url: Option<String>,
    #[serde(default)]
    categories: HashMap<String, Category>,
    #[serde(default)]
    audits: HashMap<String, Audit>,
}

#[derive(Debug, Deserialize)]
struct Category {
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Audit {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    numeric_value: Option<f64>,
    #[serde(default)]
    details: Option<AuditDetails>,
}

#[derive(Debug, Deserialize)]
struct AuditDetails {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl LighthouseResult {
    fn category_score(&self, id: &str) -> Option<f64> {
        self.categories
            .get(id)
            .and_then(|c| c.score)
            .map(|score| round2(score * 100.0))
    }

    fn numeric(&self, id: &str) -> Option<f64> {
        self.audits.get(id).and_then(|a| a.numeric_value)
    }

    fn seconds(&self, id: &str) -> Option<f64> {
        self.numeric(id).map(|ms| ms / 1000.0)
    }

    /// Weighted vitals score; `None` unless every vital audit has a score.
    fn vitals_score(&self) -> Option<f64> {
        let mut total = 0.0;
        for (id, weight) in VITAL_WEIGHTS {
            total += self.audits.get(*id)?.score? * weight;
        }
        Some(round2(total * 100.0))
    }

    fn final_screenshot(&self) -> Option<String> {
        self.audits
            .get("final-screenshot")?
            .details
            .as_ref()?
            .data
            .as_ref()?
            .as_str()
            .map(str::to_string)
    }

    fn into_report(self, url: &str) -> LighthouseReport {
        LighthouseReport {
            url: url.to_string(),
            performance_score: self.category_score("performance"),
            accessibility_score: self.category_score("accessibility"),
            best_practices_score: self.category_score("best-practices"),
            seo_score: self.category_score("seo"),
            core_web_vitals: CoreWebVitals {
                first_contentful_paint: self.seconds("first-contentful-paint"),
                speed_index: self.seconds("speed-index"),
                largest_contentful_paint: self.seconds("largest-contentful-paint"),
                total_blocking_time: self.seconds("total-blocking-time"),
                cumulative_layout_shift: self.numeric("cumulative-layout-shift"),
            },
            vitals_score: self.vitals_score(),
            final_screenshot: self.final_screenshot(),
            final_url: self.final_url,
        }
    }
}

/// PageSpeed Insights adapter.
pub struct PageSpeed {
    client: ApiClient,
    policy: RetryPolicy,
    api_key: Option<String>,
}

impl PageSpeed {
    pub fn new(client: ApiClient, policy: RetryPolicy, api_key: Option<String>) -> Self {
        Self {
            client,
            policy,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Runs a desktop audit of `url`.
    pub async fn audit(&self, url: &str) -> SourceResult<LighthouseReport> {
        let Some(api_key) = self.api_key.as_deref() else {
            return SourceResult::empty("no PageSpeed API key configured");
        };

        let mut params: Vec<(&str, &str)> =
            vec![("url", url), ("key", api_key), ("strategy", "desktop")];
        params.extend(CATEGORIES.iter().map(|category| ("category", *category)));

        log::info!("lighthouse: auditing {url}");
        let label = format!("lighthouse {url}");
        let response: Result<PageSpeedResponse, SourceError> = self
            .policy
            .execute(&label, || {
                self.client
                    .send_json(self.client.get(&self.client.endpoints().pagespeed).query(&params))
            })
            .await;

        match response {
            Ok(PageSpeedResponse {
                lighthouse_result: Some(result),
            }) => SourceResult::success(result.into_report(url)),
            Ok(PageSpeedResponse {
                lighthouse_result: None,
            }) => SourceError::Malformed("response has no lighthouseResult".into()).into(),
            Err(e) => {
                log::warn!("lighthouse: {url}: {e}");
                e.into()
            }
        }
    }

    pub async fn audit_target(&self, target: &SiteTarget) -> SourceResult<LighthouseReport> {
        self.audit(&target.url).await
    }
}

#[async_trait]
impl Source for PageSpeed {
    fn name(&self) -> SourceName {
        SourceName::Lighthouse
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let target = match input.require_target() {
            Ok(target) => target,
            Err(empty) => return empty,
        };
        self.audit_target(target)
            .await
            .map(|report| Section::Lighthouse(Box::new(report)))
    }
}
