//! SSL Labs TLS assessment.
//!
//! Assessments are asynchronous: the first request starts a scan, later
//! requests poll it until it reaches a terminal status (`READY` or `ERROR`).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Section, Source, SourceInput, SourceName};
use crate::config::SSL_MAX_POLLS;
use crate::error_handling::SourceError;
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::SourceResult;

/// Assessment summary for one host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SslReport {
    pub host: String,
    /// Grade of the first endpoint
    pub grade: Option<String>,
    pub has_warnings: Option<bool>,
    /// Whether the first endpoint is vulnerable to BEAST
    pub vuln_beast: Option<bool>,
    pub endpoints: Vec<SslEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SslEndpoint {
    pub ip_address: String,
    pub server_name: Option<String>,
    pub grade: Option<String>,
    pub has_warnings: Option<bool>,
    pub status_message: Option<String>,
    /// e.g. "TLS 1.3"
    pub protocols: Vec<String>,
    pub cipher_suites: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum AssessmentStatus {
    Dns,
    InProgress,
    Ready,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Assessment {
    status: AssessmentStatus,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    endpoints: Vec<EndpointData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointData {
    #[serde(default)]
    ip_address: String,
    #[serde(default)]
    server_name: Option<String>,
    #[serde(default)]
    grade: Option<String>,
    #[serde(default)]
    has_warnings: Option<bool>,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    details: Option<EndpointDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointDetails {
    #[serde(default)]
    protocols: Vec<Protocol>,
    #[serde(default)]
    suites: Vec<ProtocolSuites>,
    #[serde(default)]
    vuln_beast: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Protocol {
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct ProtocolSuites {
    #[serde(default)]
    list: Vec<Suite>,
}

#[derive(Debug, Deserialize)]
struct Suite {
    name: String,
}

impl Assessment {
    fn into_report(self, host: &str) -> SslReport {
        let first = self.endpoints.first();
        let grade = first.and_then(|e| e.grade.clone());
        let has_warnings = first.and_then(|e| e.has_warnings);
        let vuln_beast = first
            .and_then(|e| e.details.as_ref())
            .and_then(|d| d.vuln_beast);

        SslReport {
            host: host.to_string(),
            grade,
            has_warnings,
            vuln_beast,
            endpoints: self
                .endpoints
                .into_iter()
                .map(|endpoint| {
                    let details = endpoint.details.unwrap_or_default();
                    SslEndpoint {
                        ip_address: endpoint.ip_address,
                        server_name: endpoint.server_name,
                        grade: endpoint.grade,
                        has_warnings: endpoint.has_warnings,
                        status_message: endpoint.status_message,
                        protocols: details
                            .protocols
                            .into_iter()
                            .map(|p| format!("{} {}", p.name, p.version))
                            .collect(),
                        cipher_suites: details
                            .suites
                            .into_iter()
                            .flat_map(|s| s.list)
                            .map(|s| s.name)
                            .collect(),
                    }
                })
                .collect(),
        }
    }
}

/// SSL Labs adapter.
pub struct SslLabs {
    client: ApiClient,
    policy: RetryPolicy,
    poll_interval: Duration,
    max_polls: usize,
}

impl SslLabs {
    pub fn new(client: ApiClient, policy: RetryPolicy, poll_interval: Duration) -> Self {
        Self {
            client,
            policy,
            poll_interval,
            max_polls: SSL_MAX_POLLS,
        }
    }

    pub fn with_max_polls(mut self, max_polls: usize) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Starts an assessment of `host` and polls until it finishes.
    pub async fn assess(&self, host: &str) -> SourceResult<SslReport> {
        log::info!("ssl: starting assessment of {host}");
        let mut assessment = match self.request(host, true).await {
            Ok(assessment) => assessment,
            Err(e) => {
                log::warn!("ssl: {host}: {e}");
                return e.into();
            }
        };

        let mut polls = 0;
        loop {
            match assessment.status {
                AssessmentStatus::Ready => {
                    log::info!("ssl: {host} ready after {polls} poll(s)");
                    return SourceResult::success(assessment.into_report(host));
                }
                AssessmentStatus::Error => {
                    let message = assessment
                        .status_message
                        .unwrap_or_else(|| "assessment failed".to_string());
                    log::warn!("ssl: {host}: {message}");
                    return SourceError::Upstream {
                        status: 200,
                        message,
                    }
                    .into();
                }
                AssessmentStatus::Dns | AssessmentStatus::InProgress => {}
            }

            if polls >= self.max_polls {
                return SourceError::Timeout(self.poll_interval * polls as u32).into();
            }
            log::debug!("ssl: {host} status {:?}, polling again", assessment.status);
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            assessment = match self.request(host, false).await {
                Ok(assessment) => assessment,
                Err(e) => {
                    log::warn!("ssl: {host}: {e}");
                    return e.into();
                }
            };
        }
    }

    async fn request(&self, host: &str, start_new: bool) -> Result<Assessment, SourceError> {
        let url = format!("{}/analyze", self.client.endpoints().ssl_labs);
        let mut params = vec![("host", host), ("publish", "off"), ("all", "done")];
        if start_new {
            params.push(("startNew", "on"));
        }
        let label = format!("ssl {host}");
        self.policy
            .execute(&label, || self.client.send_json(self.client.get(&url).query(&params)))
            .await
    }
}

#[async_trait]
impl Source for SslLabs {
    fn name(&self) -> SourceName {
        SourceName::Ssl
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let target = match input.require_target() {
            Ok(target) => target,
            Err(empty) => return empty,
        };
        self.assess(target.hostname()).await.map(Section::Ssl)
    }
}
