//! Upstream API base URLs.

/// Base URLs for every external service the dashboard talks to.
///
/// `Default` points at the production services. [`Endpoints::rooted_at`] maps
/// every service under a single base URL with distinct path prefixes, which is
/// how tests point the adapters at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Universal Analytics management API (accounts, web properties, profiles)
    pub analytics_management: String,
    /// Universal Analytics core reporting endpoint
    pub analytics_data: String,
    /// GA4 Admin API (account and property discovery)
    pub analytics_admin: String,
    /// GA4 Data API (runReport)
    pub analytics_reporting: String,
    /// Search Console (webmasters v3) API
    pub search_console: String,
    /// PageSpeed Insights runPagespeed endpoint
    pub pagespeed: String,
    /// RDAP bootstrap service
    pub rdap: String,
    /// SSL Labs API
    pub ssl_labs: String,
    /// Google Trends internal API
    pub trends: String,
    /// Page that issues the Google Trends session cookie
    pub trends_cookie_page: String,
    /// Google News RSS search feed
    pub news_rss: String,
    /// OAuth consent page
    pub oauth_authorize: String,
    /// OAuth token exchange endpoint
    pub oauth_token: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            analytics_management: "https://analytics.googleapis.com/analytics/v3/management".into(),
            analytics_data: "https://analytics.googleapis.com/analytics/v3/data/ga".into(),
            analytics_admin: "https://analyticsadmin.googleapis.com/v1beta".into(),
            analytics_reporting: "https://analyticsdata.googleapis.com/v1beta".into(),
            search_console: "https://www.googleapis.com/webmasters/v3".into(),
            pagespeed: "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".into(),
            rdap: "https://rdap.org".into(),
            ssl_labs: "https://api.ssllabs.com/api/v3".into(),
            trends: "https://trends.google.com/trends/api".into(),
            trends_cookie_page: "https://trends.google.com/trends/explore".into(),
            news_rss: "https://news.google.com/rss/search".into(),
            oauth_authorize: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            oauth_token: "https://oauth2.googleapis.com/token".into(),
        }
    }
}

impl Endpoints {
    /// Maps every service under `base` (e.g. `http://127.0.0.1:4000`).
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            analytics_management: format!("{base}/analytics/v3/management"),
            analytics_data: format!("{base}/analytics/v3/data/ga"),
            analytics_admin: format!("{base}/admin/v1beta"),
            analytics_reporting: format!("{base}/data/v1beta"),
            search_console: format!("{base}/webmasters/v3"),
            pagespeed: format!("{base}/pagespeedonline/v5/runPagespeed"),
            rdap: format!("{base}/rdap"),
            ssl_labs: format!("{base}/ssllabs/api/v3"),
            trends: format!("{base}/trends/api"),
            trends_cookie_page: format!("{base}/trends/explore"),
            news_rss: format!("{base}/rss/search"),
            oauth_authorize: format!("{base}/o/oauth2/v2/auth"),
            oauth_token: format!("{base}/token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_at_strips_trailing_slash() {
        let endpoints = Endpoints::rooted_at("http://127.0.0.1:4000/");
        assert_eq!(endpoints.rdap, "http://127.0.0.1:4000/rdap");
        assert_eq!(
            endpoints.search_console,
            "http://127.0.0.1:4000/webmasters/v3"
        );
    }

    #[test]
    fn test_default_endpoints_are_https() {
        let endpoints = Endpoints::default();
        for url in [
            &endpoints.analytics_management,
            &endpoints.analytics_admin,
            &endpoints.pagespeed,
            &endpoints.ssl_labs,
            &endpoints.oauth_token,
        ] {
            assert!(url.starts_with("https://"), "{url} should use https");
        }
    }
}
