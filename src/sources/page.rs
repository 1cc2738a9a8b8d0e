//! Homepage summary: title, meta description and social profile links.

use async_trait::async_trait;
use scraper::Html;
use serde::Serialize;

use super::{Section, Source, SourceInput, SourceName};
use crate::domain::SiteTarget;
use crate::fetch::{ApiClient, BrowserHeaders, RetryPolicy};
use crate::outcome::SourceResult;
use crate::parse::{extract_meta_description, extract_social_media_links, extract_title, SocialMediaLink};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub social_links: Vec<SocialMediaLink>,
}

/// Parses a fetched homepage. `Html` is not `Send`, so this stays a plain
/// function called after the last await.
fn summarize(url: &str, body: &str) -> PageSummary {
    let document = Html::parse_document(body);
    PageSummary {
        url: url.to_string(),
        title: extract_title(&document),
        description: extract_meta_description(&document),
        social_links: extract_social_media_links(&document),
    }
}

/// Fetches the target's homepage like a browser would.
pub struct PageSummarySource {
    client: ApiClient,
    policy: RetryPolicy,
}

impl PageSummarySource {
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn summarize(&self, target: &SiteTarget) -> SourceResult<PageSummary> {
        let url = format!("{}/", target.url);
        log::info!("page: fetching {url}");

        let label = format!("page {}", target.host);
        let body = self
            .policy
            .execute(&label, || {
                self.client
                    .send_text(BrowserHeaders::apply(self.client.get(&url)))
            })
            .await;

        match body {
            Ok(body) => {
                let summary = summarize(&target.url, &body);
                log::debug!(
                    "page: {} social link(s) on {}",
                    summary.social_links.len(),
                    target.url
                );
                SourceResult::success(summary)
            }
            Err(e) => {
                log::warn!("page: {url}: {e}");
                e.into()
            }
        }
    }
}

#[async_trait]
impl Source for PageSummarySource {
    fn name(&self) -> SourceName {
        SourceName::Page
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let target = match input.require_target() {
            Ok(target) => target,
            Err(empty) => return empty,
        };
        self.summarize(target).await.map(Section::Page)
    }
}
