//! CSS selector parsing.

use scraper::Selector;

/// Parses a CSS selector that is a compile-time constant.
///
/// Only for `LazyLock` statics holding literal selectors, where a parse
/// failure is a programming error caught by the first test that touches it.
///
/// # Panics
///
/// Panics if the selector cannot be parsed.
pub(crate) fn static_selector(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        panic!("Failed to parse CSS selector '{selector_str}' in {context}: {e}")
    })
}
