//! Title and meta description extraction.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::selector::static_selector;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| static_selector("title", "TITLE_SELECTOR"));

static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    static_selector(
        "meta[name='description'], meta[name='Description'], meta[property='og:description']",
        "META_DESCRIPTION_SELECTOR",
    )
});

/// Extracts the page title, with internal whitespace collapsed.
///
/// Returns `None` when there is no `<title>` or it is blank.
pub fn extract_title(document: &Html) -> Option<String> {
    let element = document.select(&TITLE_SELECTOR).next()?;
    let title = collapse_whitespace(&element.text().collect::<String>());
    log::debug!("Extracted title: '{title}'");
    (!title.is_empty()).then_some(title)
}

/// Extracts the meta description.
///
/// `<meta name="description">` wins over `og:description` when both are
/// present, regardless of document order.
pub fn extract_meta_description(document: &Html) -> Option<String> {
    let mut og_fallback = None;
    for element in document.select(&META_DESCRIPTION_SELECTOR) {
        let Some(content) = element.value().attr("content") else {
            continue;
        };
        let content = collapse_whitespace(content);
        if content.is_empty() {
            continue;
        }
        if element.value().attr("property").is_some() {
            og_fallback.get_or_insert(content);
        } else {
            return Some(content);
        }
    }
    og_fallback
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
