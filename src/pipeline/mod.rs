//! Multi-source aggregation.
//!
//! This module provides:
//! - [`run_isolated`] / [`run_sources`]: the isolation boundary every source
//!   runs inside (panics, timeouts and failures become that source's outcome)
//! - [`Pipeline`]: the site and account reports, built from the adapters in
//!   [`crate::sources`]
//! - [`AggregatedReport`]: the merged, deterministically ordered result

mod isolation;
mod report;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::config::{Config, RETRY_MAX_ATTEMPTS};
use crate::credential::Credential;
use crate::domain::SiteTarget;
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::{EntityOutcomes, SourceResult};
use crate::sources::{
    Ga4Analytics, NewsFeed, PageSpeed, PageSummarySource, SearchConsole, Section, Source,
    SourceInput, SourceName, SslLabs, Trends, UniversalAnalytics, Whois,
};

pub use isolation::{run_isolated, run_sources};
pub use report::{AggregatedReport, ReportKind};

/// Reason recorded for per-site sources when Search Console gave no sites.
const NO_SITES_REASON: &str = "no Search Console sites available";

/// Builds and runs the adapters for one report.
///
/// Holds the injected HTTP client; adapters are created per report and
/// dropped with it.
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: ApiClient,
    policy: RetryPolicy,
    trends_policy: RetryPolicy,
    source_timeout: Duration,
    pagespeed_api_key: Option<String>,
    ssl_poll_interval: Duration,
}

impl Pipeline {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        Self {
            client,
            policy: RetryPolicy::standard(),
            trends_policy: RetryPolicy::fixed(RETRY_MAX_ATTEMPTS, config.trends_cooldown()),
            source_timeout: config.source_timeout(),
            pagespeed_api_key: config.pagespeed_api_key.clone(),
            ssl_poll_interval: config.ssl_poll_interval(),
        }
    }

    /// Replaces the retry policy of every adapter except trends.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn pagespeed(&self) -> PageSpeed {
        PageSpeed::new(
            self.client.clone(),
            self.policy.clone(),
            self.pagespeed_api_key.clone(),
        )
    }

    fn news(&self) -> NewsFeed {
        NewsFeed::new(self.client.clone(), self.policy.clone())
    }

    /// Adapters of a site report.
    pub fn site_sources(&self) -> Vec<Arc<dyn Source>> {
        vec![
            Arc::new(self.pagespeed()),
            Arc::new(Whois::new(self.client.clone(), self.policy.clone())),
            Arc::new(SslLabs::new(
                self.client.clone(),
                self.policy.clone(),
                self.ssl_poll_interval,
            )),
            Arc::new(Trends::new(self.client.clone(), self.trends_policy.clone())),
            Arc::new(self.news()),
            Arc::new(PageSummarySource::new(self.client.clone(), self.policy.clone())),
        ]
    }

    /// Adapters of an account report that need only the credential.
    fn analytics_sources(&self) -> Vec<Arc<dyn Source>> {
        vec![
            Arc::new(UniversalAnalytics::new(self.client.clone(), self.policy.clone())),
            Arc::new(Ga4Analytics::new(self.client.clone(), self.policy.clone())),
        ]
    }

    /// Lighthouse, WHOIS, SSL, trends, news and page summary for one site,
    /// all concurrently.
    pub async fn site_report(&self, target: &SiteTarget) -> AggregatedReport {
        log::info!("site report for {target}");
        let input = SourceInput::for_target(target.clone());
        let sources = run_sources(&self.site_sources(), &input, self.source_timeout).await;
        AggregatedReport::new(ReportKind::Site, target.url.clone(), sources)
    }

    /// UA, GA4 and Search Console for the signed-in user, then news and
    /// Lighthouse for every Search Console site.
    ///
    /// The analytics sources do not wait for Search Console; only the
    /// per-site stage does.
    pub async fn account_report(&self, credential: &Credential) -> AggregatedReport {
        log::info!("account report for {credential}");
        let input = SourceInput::for_credential(credential.clone());

        let analytics_sources = self.analytics_sources();
        let analytics = run_sources(&analytics_sources, &input, self.source_timeout);
        let search_then_sites = async {
            let search_console = SearchConsole::new(self.client.clone(), self.policy.clone());
            let outcome = run_isolated(&search_console, &input, self.source_timeout).await;
            let per_site = self.per_site(&outcome).await;
            (outcome, per_site)
        };
        let (mut sources, (search_console, (lighthouse, news))) =
            tokio::join!(analytics, search_then_sites);

        sources.insert(SourceName::SearchConsole, search_console);
        sources.insert(SourceName::Lighthouse, lighthouse);
        sources.insert(SourceName::News, news);
        AggregatedReport::new(ReportKind::Account, "account", sources)
    }

    /// Second stage of an account report: `(lighthouse, news)` per site.
    async fn per_site(
        &self,
        search_console: &SourceResult<Section>,
    ) -> (SourceResult<Section>, SourceResult<Section>) {
        let site_keys: Vec<&String> = match search_console {
            SourceResult::Success {
                data: Section::SearchConsole(sites),
            } if !sites.is_empty() => sites.keys().collect(),
            _ => {
                log::info!("skipping per-site sources: {NO_SITES_REASON}");
                return (
                    SourceResult::empty(NO_SITES_REASON),
                    SourceResult::empty(NO_SITES_REASON),
                );
            }
        };

        let pagespeed = self.pagespeed();
        let news = self.news();
        let results = join_all(site_keys.iter().map(|site| {
            let pagespeed = &pagespeed;
            let news = &news;
            async move {
                let target = match SiteTarget::parse(site) {
                    Ok(target) => target,
                    Err(e) => {
                        let reason = format!("'{site}' is not a web site: {e}");
                        return (SourceResult::empty(reason.clone()), SourceResult::empty(reason));
                    }
                };
                let input = SourceInput::for_target(target);
                tokio::join!(
                    run_isolated(pagespeed, &input, self.source_timeout),
                    run_isolated(news, &input, self.source_timeout),
                )
            }
        }))
        .await;

        let mut lighthouse = EntityOutcomes::new();
        let mut articles = EntityOutcomes::new();
        for (site, (audit, news)) in site_keys.into_iter().zip(results) {
            lighthouse.insert(site.clone(), audit);
            articles.insert(site.clone(), news);
        }
        (
            SourceResult::success(Section::PerSite(lighthouse)),
            SourceResult::success(Section::PerSite(articles)),
        )
    }
}

/// Keys of a site report, in report order.
pub const SITE_REPORT_SOURCES: &[SourceName] = &[
    SourceName::Lighthouse,
    SourceName::Whois,
    SourceName::Ssl,
    SourceName::Trends,
    SourceName::News,
    SourceName::Page,
];

/// Keys of an account report, in report order.
pub const ACCOUNT_REPORT_SOURCES: &[SourceName] = &[
    SourceName::Analytics,
    SourceName::AnalyticsGa4,
    SourceName::SearchConsole,
    SourceName::Lighthouse,
    SourceName::News,
];
