// Dashboard routes served on an ephemeral port.

mod helpers;

use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::{json, Value};

use helpers::{base_url, mock_site_upstreams, test_config};
use seo_dashboard::server::{build_router, DashboardState};
use seo_dashboard::Config;

/// Serves the dashboard in the background and returns its base URL.
async fn spawn_dashboard(config: Config) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    let app = build_router(DashboardState::new(config));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("dashboard server failed");
    });
    format!("http://{addr}")
}

fn no_redirects() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build test client")
}

#[tokio::test]
async fn test_home_page_has_form() {
    let upstream = Server::run();
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = reqwest::get(format!("{dashboard}/")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("action=\"/process_url\""));
    assert!(body.contains("href=\"/auth\""));
}

#[tokio::test]
async fn test_api_report_rejects_empty_target() {
    let upstream = Server::run();
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = reqwest::get(format!("{dashboard}/api/report?url=")).await.unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "target cannot be empty");
}

#[tokio::test]
async fn test_api_report_serves_site_report() {
    let upstream = Server::run();
    mock_site_upstreams(&upstream, 1);
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let target = base_url(&upstream);
    let response = no_redirects()
        .get(format!("{dashboard}/api/report"))
        .query(&[("url", target.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "site");
    assert_eq!(body["target"], target);
    assert_eq!(body["sources"]["ssl"]["status"], "success");
    assert_eq!(body["sources"]["ssl"]["data"]["grade"], "B");
    assert_eq!(body["sources"]["whois"]["status"], "empty");
    assert_eq!(body["sources"]["trends"]["status"], "failure");
    assert_eq!(body["sources"]["trends"]["kind"], "malformed_response");
    assert_eq!(body["summary"]["succeeded"], 3);
}

#[tokio::test]
async fn test_process_url_renders_html_report() {
    let upstream = Server::run();
    mock_site_upstreams(&upstream, 1);
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = no_redirects()
        .post(format!("{dashboard}/process_url"))
        .form(&[("url", base_url(&upstream))])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("<h2>lighthouse</h2>"));
    assert!(body.contains("<h2>page</h2>"));
}

#[tokio::test]
async fn test_auth_redirects_to_consent_page() {
    let upstream = Server::run();
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = no_redirects().get(format!("{dashboard}/auth")).send().await.unwrap();
    assert_eq!(response.status(), 307);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    assert!(location.starts_with(&format!("{}/o/oauth2/v2/auth?", base_url(&upstream))));
    assert!(location.contains("client_id=client-id"));
    assert!(location.contains("access_type=offline"));
}

#[tokio::test]
async fn test_auth_without_client_id_is_unavailable() {
    let upstream = Server::run();
    let config = Config {
        google_client_id: None,
        ..test_config(&upstream)
    };
    let dashboard = spawn_dashboard(config).await;

    let response = no_redirects().get(format!("{dashboard}/auth")).send().await.unwrap();
    assert_eq!(response.status(), 503);
    let body = response.text().await.unwrap();
    assert!(body.contains("GOOGLE_CLIENT_ID"));
}

#[tokio::test]
async fn test_callback_with_denied_consent() {
    let upstream = Server::run();
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = reqwest::get(format!("{dashboard}/callback?error=access_denied&format=json"))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "authorization was not granted: access_denied");
}

#[tokio::test]
async fn test_callback_without_code() {
    let upstream = Server::run();
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = reqwest::get(format!("{dashboard}/callback")).await.unwrap();
    assert_eq!(response.status(), 400);
    let body = response.text().await.unwrap();
    assert!(body.contains("authorization code is empty"));
}

#[tokio::test]
async fn test_callback_exchanges_code_and_reports_account() {
    let upstream = Server::run();
    upstream.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("POST", "/token"),
            request::body(url_decoded(contains(("code", "4/0Adeu5B")))),
            request::body(url_decoded(contains(("grant_type", "authorization_code")))),
        ])
        .respond_with(json_encoded(json!({
            "access_token": "ya29.exchanged",
            "expires_in": 3599,
            "token_type": "Bearer"
        }))),
    );
    upstream.expect(
        Expectation::matching(httptest::all_of![
            request::method_path("GET", "/analytics/v3/management/accounts"),
            request::headers(contains(("authorization", "Bearer ya29.exchanged"))),
        ])
        .respond_with(json_encoded(json!({"items": []}))),
    );
    upstream.expect(
        Expectation::matching(request::method_path("GET", "/admin/v1beta/accounts"))
            .respond_with(json_encoded(json!({"accounts": []}))),
    );
    upstream.expect(
        Expectation::matching(request::method_path("GET", "/webmasters/v3/sites"))
            .respond_with(json_encoded(json!({}))),
    );
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = reqwest::get(format!("{dashboard}/callback?code=4/0Adeu5B&format=json"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "account");
    assert_eq!(body["sources"]["analytics"]["status"], "empty");
    assert_eq!(body["sources"]["search_console"]["reason"], "no sites");
    assert_eq!(
        body["sources"]["lighthouse"]["reason"],
        "no Search Console sites available"
    );
    assert_eq!(body["summary"]["empty"], 5);
}

#[tokio::test]
async fn test_callback_with_rejected_code() {
    let upstream = Server::run();
    upstream.expect(
        Expectation::matching(request::method_path("POST", "/token")).respond_with(
            status_code(400)
                .append_header("Content-Type", "application/json")
                .body(r#"{"error": "invalid_grant", "error_description": "Bad Request"}"#),
        ),
    );
    let dashboard = spawn_dashboard(test_config(&upstream)).await;

    let response = reqwest::get(format!("{dashboard}/callback?code=stale&format=json"))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("token exchange failed"));
}
