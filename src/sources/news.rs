//! News mentions from the Google News RSS search feed.

use async_trait::async_trait;
use chrono::DateTime;
use scraper::Html;
use serde::{Deserialize, Serialize};

use super::{Section, Source, SourceInput, SourceName};
use crate::error_handling::{truncate_message, SourceError};
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::SourceResult;
use crate::parse::static_selector;

/// One news item mentioning the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    /// Anchor text of the item's HTML description
    pub description: Option<String>,
    /// Publisher name
    pub source: Option<String>,
    /// RFC 3339 when the feed date parses, the raw feed value otherwise
    pub published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    #[serde(default)]
    source: Option<RssSource>,
}

#[derive(Debug, Deserialize)]
struct RssSource {
    #[serde(rename = "$text", default)]
    name: Option<String>,
}

/// Parses an RSS 2.0 document into articles.
fn parse_feed(xml: &str) -> Result<Vec<NewsArticle>, SourceError> {
    let rss: Rss = quick_xml::de::from_str(xml)
        .map_err(|e| SourceError::Malformed(truncate_message(&format!("invalid RSS: {e}"))))?;
    Ok(rss.channel.items.into_iter().map(RssItem::into_article).collect())
}

impl RssItem {
    fn into_article(self) -> NewsArticle {
        let (description, font_source) = self
            .description
            .as_deref()
            .map(parse_description)
            .unwrap_or_default();
        NewsArticle {
            title: self.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            link: self.link.map(|l| l.trim().to_string()).unwrap_or_default(),
            description,
            source: self
                .source
                .and_then(|s| s.name)
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .or(font_source),
            published: self.pub_date.map(|date| normalize_date(&date)),
        }
    }
}

/// Google News descriptions are an HTML fragment: `<a href=…>headline</a>
/// &nbsp;&nbsp;<font color="#6f6f6f">Publisher</font>`.
fn parse_description(fragment: &str) -> (Option<String>, Option<String>) {
    let html = Html::parse_fragment(fragment);
    let text_of = |selector: &str| {
        html.select(&static_selector(selector, "news description"))
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    };
    (text_of("a"), text_of("font"))
}

/// RFC 2822 feed date to RFC 3339; unparseable dates pass through trimmed.
fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}

/// News RSS adapter.
pub struct NewsFeed {
    client: ApiClient,
    policy: RetryPolicy,
}

impl NewsFeed {
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Articles matching `query`, in feed order.
    pub async fn articles_for(&self, query: &str) -> SourceResult<Vec<NewsArticle>> {
        let url = &self.client.endpoints().news_rss;
        let params = [("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")];
        log::info!("news: searching for '{query}'");

        let label = format!("news {query}");
        let articles = self
            .policy
            .execute(&label, || {
                self.client.send_text(self.client.get(url).query(&params))
            })
            .await
            .and_then(|body| parse_feed(&body));

        match articles {
            Ok(articles) if articles.is_empty() => {
                SourceResult::empty(format!("no news for '{query}'"))
            }
            Ok(articles) => {
                log::debug!("news: {} article(s) for '{query}'", articles.len());
                SourceResult::success(articles)
            }
            Err(e) => {
                log::warn!("news: '{query}': {e}");
                e.into()
            }
        }
    }
}

#[async_trait]
impl Source for NewsFeed {
    fn name(&self) -> SourceName {
        SourceName::News
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let target = match input.require_target() {
            Ok(target) => target,
            Err(empty) => return empty,
        };
        let query = target.domain();
        self.articles_for(&query).await.map(Section::News)
    }
}
