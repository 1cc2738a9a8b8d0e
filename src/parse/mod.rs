//! HTML parsing and data extraction.
//!
//! This module extracts the page summary shown in a site report:
//! - Page title and meta description
//! - Social media profile links
//!
//! All parsing is done using CSS selectors via the `scraper` crate.

mod html;
mod selector;
mod social;

// Re-export public API
pub use html::{extract_meta_description, extract_title};
pub(crate) use selector::static_selector;
pub use social::{extract_social_media_links, SocialMediaLink, SocialPlatform};
