//! The aggregated report handed to the presentation layer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::outcome::{OutcomeTally, SourceResult};
use crate::sources::{Section, SourceName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Public data about one site
    Site,
    /// Data behind a signed-in Google account
    Account,
}

/// One outcome per attempted source.
///
/// A key being present means the source was attempted, not that it
/// succeeded. Nothing time-dependent is stored here, so two runs against the
/// same upstream data serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedReport {
    pub kind: ReportKind,
    /// Normalized target URL for site reports, `"account"` otherwise
    pub target: String,
    pub sources: BTreeMap<SourceName, SourceResult<Section>>,
    pub summary: OutcomeTally,
}

impl AggregatedReport {
    pub fn new(
        kind: ReportKind,
        target: impl Into<String>,
        sources: BTreeMap<SourceName, SourceResult<Section>>,
    ) -> Self {
        let mut summary = OutcomeTally::default();
        for outcome in sources.values() {
            summary.record(outcome);
        }
        Self {
            kind,
            target: target.into(),
            sources,
            summary,
        }
    }

    pub fn get(&self, name: SourceName) -> Option<&SourceResult<Section>> {
        self.sources.get(&name)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
