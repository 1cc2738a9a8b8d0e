//! Source adapters.
//!
//! One adapter per external API family. Each implements [`Source`]: it takes
//! the shared [`SourceInput`] and returns exactly one `SourceResult<Section>`,
//! converting every upstream error into data.

pub mod analytics;
pub mod ga4;
pub mod news;
pub mod page;
pub mod pagespeed;
pub mod search_console;
pub mod ssl;
pub mod trends;
pub mod whois;

use async_trait::async_trait;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;

use crate::credential::Credential;
use crate::domain::SiteTarget;
use crate::outcome::{EntityOutcomes, SourceResult};

pub use analytics::{AccountAnalytics, PropertyAnalytics, UniversalAnalytics, ViewMetrics};
pub use ga4::{Ga4Account, Ga4Analytics, Ga4Property, MergedMetricSet};
pub use news::{NewsArticle, NewsFeed};
pub use page::{PageSummary, PageSummarySource};
pub use pagespeed::{CoreWebVitals, LighthouseReport, PageSpeed};
pub use search_console::{QueryRow, SearchConsole, SiteSearchData};
pub use ssl::{SslEndpoint, SslLabs, SslReport};
pub use trends::{InterestPoint, RisingQuery, TrendReport, Trends};
pub use whois::{Contact, Whois, WhoisRecord};

/// Logical source name; the key of a report section.
///
/// Declaration order is the order sections appear in a report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, EnumIterMacro,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    Analytics,
    AnalyticsGa4,
    SearchConsole,
    Lighthouse,
    Whois,
    Ssl,
    Trends,
    News,
    Page,
}

impl SourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::Analytics => "analytics",
            SourceName::AnalyticsGa4 => "analytics_ga4",
            SourceName::SearchConsole => "search_console",
            SourceName::Lighthouse => "lighthouse",
            SourceName::Whois => "whois",
            SourceName::Ssl => "ssl",
            SourceName::Trends => "trends",
            SourceName::News => "news",
            SourceName::Page => "page",
        }
    }
}

impl std::fmt::Display for SourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of one report section.
///
/// Untagged: the report key already says which variant it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section {
    Analytics(EntityOutcomes<AccountAnalytics>),
    AnalyticsGa4(EntityOutcomes<Ga4Account>),
    SearchConsole(EntityOutcomes<SiteSearchData>),
    Lighthouse(Box<LighthouseReport>),
    Whois(WhoisRecord),
    Ssl(SslReport),
    Trends(TrendReport),
    News(Vec<NewsArticle>),
    Page(PageSummary),
    /// One outcome per Search Console site, for sources run in the second
    /// stage of an account report
    PerSite(EntityOutcomes<Section>),
}

/// What an adapter gets to work with.
///
/// The credential is shared read-only across every adapter of a run.
#[derive(Debug, Clone, Default)]
pub struct SourceInput {
    pub credential: Option<Credential>,
    pub target: Option<SiteTarget>,
}

impl SourceInput {
    pub fn for_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            target: None,
        }
    }

    pub fn for_target(target: SiteTarget) -> Self {
        Self {
            credential: None,
            target: Some(target),
        }
    }

    /// The credential, or the `Empty` outcome an adapter returns without one.
    pub(crate) fn require_credential<T>(&self) -> Result<&Credential, SourceResult<T>> {
        self.credential
            .as_ref()
            .ok_or_else(|| SourceResult::empty("not signed in"))
    }

    /// The site target, or the `Empty` outcome an adapter returns without one.
    pub(crate) fn require_target<T>(&self) -> Result<&SiteTarget, SourceResult<T>> {
        self.target
            .as_ref()
            .ok_or_else(|| SourceResult::empty("no target site"))
    }
}

/// An external data source.
#[async_trait]
pub trait Source: Send + Sync {
    fn name(&self) -> SourceName;

    /// Runs the adapter to completion. Never panics on upstream data and never
    /// returns an error: every failure is a `SourceResult::Failure`.
    async fn collect(&self, input: &SourceInput) -> SourceResult<Section>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_source_names_serialize_like_as_str() {
        for name in SourceName::iter() {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.as_str()));
        }
    }

    #[test]
    fn test_source_name_order_follows_declaration() {
        let mut shuffled = vec![SourceName::Page, SourceName::Analytics, SourceName::Ssl];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![SourceName::Analytics, SourceName::Ssl, SourceName::Page]
        );
    }

    #[test]
    fn test_missing_inputs_are_empty() {
        let input = SourceInput::default();
        let outcome = input.require_credential::<()>().unwrap_err();
        assert!(outcome.is_empty());
        let outcome = input.require_target::<()>().unwrap_err();
        assert!(outcome.is_empty());
    }
}
