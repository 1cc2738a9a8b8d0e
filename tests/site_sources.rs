// Site report adapters against mocked upstreams.

mod helpers;

use std::time::Duration;

use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;

use helpers::{base_url, fast_retry, mock_trends_cookie_page, test_client};
use seo_dashboard::sources::{NewsFeed, PageSpeed, PageSummarySource, SslLabs, Trends, Whois};
use seo_dashboard::{FailureKind, RetryPolicy, SiteTarget, SourceResult};

fn pagespeed_body() -> serde_json::Value {
    json!({
        "id": "https://example.com/",
        "lighthouseResult": {
            "finalUrl": "https://example.com/",
            "categories": {
                "performance": {"score": 0.91},
                "accessibility": {"score": 0.88},
                "best-practices": {"score": 1.0},
                "seo": {"score": 0.75}
            },
            "audits": {
                "first-contentful-paint": {"score": 1, "numericValue": 500},
                "speed-index": {"score": 1, "numericValue": 1000},
                "largest-contentful-paint": {"score": 1, "numericValue": 1500},
                "total-blocking-time": {"score": 1, "numericValue": 0},
                "cumulative-layout-shift": {"score": 1, "numericValue": 0.0}
            }
        }
    })
}

#[tokio::test]
async fn test_pagespeed_retries_rate_limits_then_succeeds() {
    let server = Server::run();
    // Exactly three requests: two rate-limited, one success
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/pagespeedonline/v5/runPagespeed"),
            request::query(url_decoded(contains(("strategy", "desktop")))),
            request::query(url_decoded(contains(("key", "test-key")))),
            request::query(url_decoded(contains(("category", "best-practices")))),
        ])
        .times(3)
        .respond_with(httptest::cycle![
            status_code(429).body("quota exceeded"),
            status_code(429).body("quota exceeded"),
            json_encoded(pagespeed_body()),
        ]),
    );

    let pagespeed = PageSpeed::new(test_client(&server), fast_retry(), Some("test-key".into()));
    let outcome = pagespeed.audit("https://example.com").await;

    let report = outcome.data().expect("audit should succeed after retries");
    assert_eq!(report.performance_score, Some(91.0));
    assert_eq!(report.seo_score, Some(75.0));
    assert_eq!(report.vitals_score, Some(100.0));
    assert_eq!(report.core_web_vitals.largest_contentful_paint, Some(1.5));
}

#[tokio::test]
async fn test_pagespeed_gives_up_after_three_rate_limits() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/pagespeedonline/v5/runPagespeed"))
            .times(3)
            .respond_with(status_code(429)),
    );

    let pagespeed = PageSpeed::new(test_client(&server), fast_retry(), Some("test-key".into()));
    let outcome = pagespeed.audit("https://example.com").await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::RateLimited));
}

#[tokio::test]
async fn test_pagespeed_bad_request_is_not_retried() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/pagespeedonline/v5/runPagespeed"))
            .times(1)
            .respond_with(
                status_code(400)
                    .append_header("Content-Type", "application/json")
                    .body(
                        r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}}"#,
                    ),
            ),
    );

    let pagespeed = PageSpeed::new(test_client(&server), fast_retry(), Some("test-key".into()));
    match pagespeed.audit("https://example.com").await {
        SourceResult::Failure {
            kind,
            message,
            http_status,
        } => {
            assert_eq!(kind, FailureKind::UpstreamHttp);
            assert_eq!(http_status, Some(400));
            assert!(message.contains("API key not valid"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ssl_labs_polls_until_ready() {
    let server = Server::run();
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/ssllabs/api/v3/analyze"),
            request::query(url_decoded(contains(("host", "example.com")))),
            request::query(url_decoded(contains(("startNew", "on")))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({"host": "example.com", "status": "DNS"}))),
    );
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/ssllabs/api/v3/analyze"),
            request::query(url_decoded(not(contains(("startNew", "on"))))),
        ])
        .times(2)
        .respond_with(httptest::cycle![
            json_encoded(json!({
                "host": "example.com",
                "status": "IN_PROGRESS",
                "endpoints": [{"ipAddress": "93.184.216.34", "statusMessage": "In progress"}]
            })),
            json_encoded(json!({
                "host": "example.com",
                "status": "READY",
                "endpoints": [{
                    "ipAddress": "93.184.216.34",
                    "grade": "A",
                    "hasWarnings": true,
                    "details": {
                        "protocols": [{"name": "TLS", "version": "1.3"}],
                        "vulnBeast": false
                    }
                }]
            })),
        ]),
    );

    let ssl = SslLabs::new(test_client(&server), RetryPolicy::none(), Duration::ZERO);
    let outcome = ssl.assess("example.com").await;

    let report = outcome.data().expect("assessment should complete");
    assert_eq!(report.grade.as_deref(), Some("A"));
    assert_eq!(report.has_warnings, Some(true));
    assert_eq!(report.vuln_beast, Some(false));
    assert_eq!(report.endpoints[0].protocols, vec!["TLS 1.3"]);
}

#[tokio::test]
async fn test_ssl_labs_error_status_is_failure() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/ssllabs/api/v3/analyze"))
            .times(1)
            .respond_with(json_encoded(json!({
                "host": "nonexistent.invalid",
                "status": "ERROR",
                "statusMessage": "Unable to resolve domain name"
            }))),
    );

    let ssl = SslLabs::new(test_client(&server), RetryPolicy::none(), Duration::ZERO);
    match ssl.assess("nonexistent.invalid").await {
        SourceResult::Failure { kind, message, .. } => {
            assert_eq!(kind, FailureKind::UpstreamHttp);
            assert!(message.contains("Unable to resolve domain name"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ssl_labs_gives_up_after_max_polls() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/ssllabs/api/v3/analyze"))
            .times(3)
            .respond_with(json_encoded(json!({"host": "example.com", "status": "IN_PROGRESS"}))),
    );

    let ssl = SslLabs::new(test_client(&server), RetryPolicy::none(), Duration::ZERO)
        .with_max_polls(2);
    let outcome = ssl.assess("example.com").await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Timeout));
}

#[tokio::test]
async fn test_whois_rdap_lookup_uses_registrable_domain() {
    let server = Server::run();
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/rdap/domain/example.co.uk"),
            request::headers(contains(("accept", "application/rdap+json"))),
        ])
        .respond_with(json_encoded(json!({
            "objectClassName": "domain",
            "ldhName": "example.co.uk",
            "status": ["active"],
            "events": [{"eventAction": "registration", "eventDate": "2001-02-03T00:00:00Z"}],
            "nameservers": [{"ldhName": "NS1.EXAMPLE.NET"}],
            "entities": [{
                "roles": ["registrar"],
                "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar Ltd"]]]
            }]
        }))),
    );

    let whois = Whois::new(test_client(&server), RetryPolicy::none());
    let record = whois.lookup("shop.example.co.uk").await;
    let record = record.data().expect("lookup should succeed");
    assert_eq!(record.domain_name, "example.co.uk");
    assert_eq!(record.registrar.as_deref(), Some("Example Registrar Ltd"));
    assert_eq!(record.name_servers, vec!["ns1.example.net"]);
}

#[tokio::test]
async fn test_whois_not_found_is_empty() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/rdap/domain/unregistered.com"))
            .respond_with(status_code(404)),
    );

    let whois = Whois::new(test_client(&server), RetryPolicy::none());
    assert!(whois.lookup("unregistered.com").await.is_empty());
}

#[tokio::test]
async fn test_trends_widget_flow() {
    let server = Server::run();
    mock_trends_cookie_page(&server, 1);
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/trends/api/explore"),
            request::query(url_decoded(contains(("hl", "en-US")))),
            request::headers(contains(("cookie", "NID=test-session"))),
        ])
        .respond_with(status_code(200).body(
            r#")]}'
{"widgets":[
  {"id":"TIMESERIES","token":"ts-token","request":{"time":"today 5-y"}},
  {"id":"RELATED_QUERIES","token":"rq-token","request":{"keyword":"example.com"}}
]}"#,
        )),
    );
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/trends/api/widgetdata/multiline"),
            request::query(url_decoded(contains(("token", "ts-token")))),
        ])
        .respond_with(status_code(200).body(
            r#")]}',
{"default":{"timelineData":[{"time":"1577836800","value":[12]},{"time":"1578441600","value":[40]}]}}"#,
        )),
    );
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/trends/api/widgetdata/relatedsearches"),
            request::query(url_decoded(contains(("token", "rq-token")))),
        ])
        .respond_with(status_code(200).body(
            r#")]}',
{"default":{"rankedList":[{"rankedKeyword":[]},{"rankedKeyword":[{"query":"example login","value":350,"formattedValue":"+350%"}]}]}}"#,
        )),
    );

    let trends = Trends::new(test_client(&server), RetryPolicy::none());
    let outcome = trends.keyword_report("example.com").await;
    let report = outcome.data().expect("trends should succeed");
    assert_eq!(report.keyword, "example.com");
    assert_eq!(report.interest.len(), 2);
    assert_eq!(report.interest[1].popularity, 40);
    assert_eq!(report.rising[0].query, "example login");
}

#[tokio::test]
async fn test_trends_rate_limit_uses_cooldown_retry() {
    let server = Server::run();
    mock_trends_cookie_page(&server, 1);
    server.expect(
        Expectation::matching(request::method_path("GET", "/trends/api/explore"))
            .times(3)
            .respond_with(status_code(429)),
    );

    let trends = Trends::new(
        test_client(&server),
        RetryPolicy::fixed(3, Duration::from_millis(5)),
    );
    let outcome = trends.keyword_report("example.com").await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::RateLimited));
}

#[tokio::test]
async fn test_trends_cookie_page_failure_still_tries_explore() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/trends/explore"))
            .times(1)
            .respond_with(status_code(503)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/trends/api/explore"))
            .times(1)
            .respond_with(status_code(200).body(")]}'\n{\"widgets\": []}")),
    );

    let trends = Trends::new(test_client(&server), RetryPolicy::none());
    let outcome = trends.keyword_report("example.com").await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::MalformedResponse));
}

#[tokio::test]
async fn test_news_feed() {
    let server = Server::run();
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/rss/search"),
            request::query(url_decoded(contains(("q", "example.com")))),
        ])
        .respond_with(
            status_code(200)
                .append_header("Content-Type", "application/rss+xml")
                .body(
                    r##"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>News</title>
<item>
  <title>Example raises funding</title>
  <link>https://news.example/a</link>
  <pubDate>Tue, 02 Jan 2024 08:00:00 GMT</pubDate>
  <description>&lt;a href="https://news.example/a"&gt;Example raises funding&lt;/a&gt;&lt;font color="#6f6f6f"&gt;Daily&lt;/font&gt;</description>
</item>
</channel></rss>"##,
                ),
        ),
    );

    let news = NewsFeed::new(test_client(&server), RetryPolicy::none());
    let outcome = news.articles_for("example.com").await;
    let articles = outcome.data().expect("feed should parse");
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].source.as_deref(), Some("Daily"));
    assert_eq!(articles[0].published.as_deref(), Some("2024-01-02T08:00:00+00:00"));
}

#[tokio::test]
async fn test_page_summary_fetches_homepage() {
    let server = Server::run();
    server.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/"),
            request::headers(contains(("accept-language", "en-US,en;q=0.9"))),
        ])
        .respond_with(status_code(200).body(
            r#"<html><head><title>Example Home</title>
<meta name="description" content="The example site."></head>
<body><a href="https://github.com/example">GitHub</a></body></html>"#,
        )),
    );

    let target = SiteTarget::parse(&base_url(&server)).unwrap();
    let page = PageSummarySource::new(test_client(&server), RetryPolicy::none());
    let outcome = page.summarize(&target).await;
    let summary = outcome.data().expect("homepage should be summarized");
    assert_eq!(summary.title.as_deref(), Some("Example Home"));
    assert_eq!(summary.description.as_deref(), Some("The example site."));
    assert_eq!(summary.social_links.len(), 1);
}
