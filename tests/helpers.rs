// Shared test helpers for pointing the adapters at an httptest mock server.

use std::time::Duration;

use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;
use seo_dashboard::{ApiClient, Config, Credential, Endpoints, RetryPolicy};

/// Base URL of the mock server, without a trailing slash.
#[allow(dead_code)]
pub fn base_url(server: &Server) -> String {
    format!("http://{}", server.addr())
}

/// A config whose every endpoint lives on `server`, with no waiting between
/// SSL polls or after a trends rate limit.
#[allow(dead_code)]
pub fn test_config(server: &Server) -> Config {
    Config {
        endpoints: Endpoints::rooted_at(&base_url(server)),
        timeout_seconds: 5,
        source_timeout_seconds: 10,
        pagespeed_api_key: Some("test-key".to_string()),
        google_client_id: Some("client-id".to_string()),
        google_client_secret: Some("client-secret".to_string()),
        ssl_poll_interval_secs: 0,
        trends_cooldown_secs: 0,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn test_client(server: &Server) -> ApiClient {
    ApiClient::from_config(&test_config(server)).expect("Failed to build client")
}

/// Three attempts, 10ms apart.
#[allow(dead_code)]
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::fixed(3, Duration::from_millis(10))
}

#[allow(dead_code)]
pub fn test_credential() -> Credential {
    Credential::new("ya29.test-token")
}

/// Answers the trends cookie page `runs` times, setting `NID=test-session`.
#[allow(dead_code)]
pub fn mock_trends_cookie_page(server: &Server, runs: usize) {
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/trends/explore"),
            request::query(url_decoded(contains(("geo", "US")))),
        ])
        .times(runs)
        .respond_with(
            status_code(200)
                .append_header("Set-Cookie", "NID=test-session; Path=/; HttpOnly")
                .body("<html></html>"),
        ),
    );
}

/// Mocks every site report upstream, answering `runs` reports.
#[allow(dead_code)]
pub fn mock_site_upstreams(server: &Server, runs: usize) {
    server.expect(
        Expectation::matching(request::method_path("GET", "/pagespeedonline/v5/runPagespeed"))
            .times(runs)
            .respond_with(json_encoded(json!({
                "lighthouseResult": {
                    "finalUrl": "http://localhost/",
                    "categories": {"performance": {"score": 0.5}, "seo": {"score": 0.9}},
                    "audits": {}
                }
            }))),
    );
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method("GET"),
            request::path(matches("^/rdap/domain/")),
        ])
            .times(runs)
            .respond_with(status_code(404)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/ssllabs/api/v3/analyze"))
            .times(runs)
            .respond_with(json_encoded(json!({
                "host": "127.0.0.1",
                "status": "READY",
                "endpoints": [{"ipAddress": "127.0.0.1", "grade": "B"}]
            }))),
    );
    mock_trends_cookie_page(server, runs);
    server.expect(
        Expectation::matching(request::method_path("GET", "/trends/api/explore"))
            .times(runs)
            .respond_with(status_code(200).body(")]}'\n{\"widgets\": []}")),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/rss/search"))
            .times(runs)
            .respond_with(status_code(200).body(
                "<rss version=\"2.0\"><channel><title>News</title></channel></rss>",
            )),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .times(runs)
            .respond_with(status_code(200).body(
                "<html><head><title>Local</title></head><body></body></html>",
            )),
    );
}
