//! Social media link extraction.
//!
//! Finds the profile links a site advertises on its homepage, identifying
//! platform, URL, and identifier (username/handle) for each link.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use strum_macros::{EnumIter as EnumIterMacro, IntoStaticStr};
use url::Url;

use super::selector::static_selector;

/// Social platforms recognized on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIterMacro, IntoStaticStr)]
pub enum SocialPlatform {
    LinkedIn,
    Twitter,
    Facebook,
    Instagram,
    YouTube,
    GitHub,
    TikTok,
    Pinterest,
    Snapchat,
    Reddit,
}

impl SocialPlatform {
    fn pattern(self) -> &'static str {
        match self {
            SocialPlatform::LinkedIn => {
                r"^https?://(?:[a-z]{2,3}\.|www\.)?linkedin\.com/(?:company|in|school)/([^/?#]+)"
            }
            SocialPlatform::Twitter => r"^https?://(?:www\.|mobile\.)?(?:twitter\.com|x\.com)/([^/?#]+)",
            SocialPlatform::Facebook => r"^https?://(?:www\.|m\.)?facebook\.com/([^/?#]+)",
            SocialPlatform::Instagram => r"^https?://(?:www\.)?instagram\.com/([^/?#]+)",
            SocialPlatform::YouTube => {
                r"^https?://(?:www\.)?youtube\.com/(?:channel/|c/|user/|@)([^/?#]+)"
            }
            SocialPlatform::GitHub => r"^https?://(?:www\.)?github\.com/([^/?#]+)",
            SocialPlatform::TikTok => r"^https?://(?:www\.)?tiktok\.com/@([^/?#]+)",
            SocialPlatform::Pinterest => r"^https?://(?:[a-z]{2}\.|www\.)?pinterest\.(?:com|co\.uk)/([^/?#]+)",
            SocialPlatform::Snapchat => r"^https?://(?:www\.)?snapchat\.com/add/([^/?#]+)",
            SocialPlatform::Reddit => r"^https?://(?:www\.|old\.)?reddit\.com/(?:r|u|user)/([^/?#]+)",
        }
    }
}

/// First path segments that are share/intent endpoints rather than profiles.
const NON_PROFILE_SEGMENTS: &[&str] = &[
    "sharer",
    "sharer.php",
    "share",
    "intent",
    "home",
    "login",
    "dialog",
    "plugins",
    "hashtag",
    "search",
    "p",
    "watch",
];

/// A social profile link found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialMediaLink {
    pub platform: SocialPlatform,
    pub url: String,
    /// Username, handle, or id taken from the URL
    pub identifier: Option<String>,
}

static PLATFORM_PATTERNS: LazyLock<Vec<(SocialPlatform, Regex)>> = LazyLock::new(|| {
    use strum::IntoEnumIterator;
    SocialPlatform::iter()
        .map(|platform| {
            let re = Regex::new(platform.pattern()).unwrap_or_else(|e| {
                panic!("Failed to compile {platform:?} link pattern: {e}")
            });
            (platform, re)
        })
        .collect()
});

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| static_selector("a[href]", "ANCHOR_SELECTOR"));

/// Extracts social media profile links from an HTML document.
///
/// Protocol-relative (`//twitter.com/x`) and scheme-less (`twitter.com/x`)
/// links are upgraded to `https`. Share buttons and intent links are skipped.
/// Links are deduplicated by URL, ignoring a trailing slash, and returned in
/// document order.
pub fn extract_social_media_links(document: &Html) -> Vec<SocialMediaLink> {
    let mut links = Vec::new();
    let mut seen_urls = HashSet::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = absolutize(href.trim()) else {
            continue;
        };

        for (platform, re) in PLATFORM_PATTERNS.iter() {
            let Some(caps) = re.captures(&url) else {
                continue;
            };
            let identifier = caps.get(1).map(|m| m.as_str().to_string());
            if identifier
                .as_deref()
                .is_some_and(|id| NON_PROFILE_SEGMENTS.contains(&id.to_ascii_lowercase().as_str()))
            {
                break;
            }

            let url = strip_query_and_fragment(&url);
            if seen_urls.insert(url.trim_end_matches('/').to_ascii_lowercase()) {
                links.push(SocialMediaLink {
                    platform: *platform,
                    url,
                    identifier,
                });
            }
            break;
        }
    }

    links
}

/// Upgrades protocol-relative and scheme-less links; drops relative paths,
/// `mailto:`, `javascript:` and other non-web links.
fn absolutize(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else if let Some(rest) = href.strip_prefix("//") {
        Some(format!("https://{rest}"))
    } else if href.starts_with('/') || href.starts_with('#') || href.contains(':') {
        None
    } else {
        Some(format!("https://{href}"))
    }
}

/// Tracking parameters and fragments are not part of a profile URL.
fn strip_query_and_fragment(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}
