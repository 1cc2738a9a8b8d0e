//! Request headers for page fetches.

use reqwest::header::{HeaderName, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};

/// Browser-like headers for fetching a site's own HTML.
///
/// API calls go out with reqwest's defaults; only the homepage fetch uses
/// these, since some sites serve a stripped page (or a challenge) to clients
/// that do not look like a browser.
pub(crate) struct BrowserHeaders;

impl BrowserHeaders {
    pub(crate) fn apply(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(CACHE_CONTROL, "max-age=0")
            .header(HeaderName::from_static("upgrade-insecure-requests"), "1")
    }
}
