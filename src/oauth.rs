//! Google OAuth 2.0 authorization-code flow.
//!
//! The dashboard never stores tokens: the code from the consent redirect is
//! exchanged for an access token, which lives for one account report.

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::credential::Credential;
use crate::error_handling::SourceError;
use crate::fetch::ApiClient;

/// Read-only scopes requested at consent.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/analytics.readonly",
    "https://www.googleapis.com/auth/webmasters.readonly",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// Errors in the OAuth flow.
#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("OAuth is not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("invalid authorization endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("authorization code is empty")]
    EmptyCode,

    #[error("token exchange failed: {0}")]
    Exchange(#[from] SourceError),

    #[error("token response has no access_token")]
    MissingAccessToken,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

fn client_id(config: &Config) -> Result<&str, OAuthError> {
    config
        .google_client_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or(OAuthError::NotConfigured("GOOGLE_CLIENT_ID"))
}

/// The consent page URL the `/auth` route redirects to.
pub fn authorization_url(config: &Config) -> Result<Url, OAuthError> {
    let scope = SCOPES.join(" ");
    let endpoint = &config.endpoints.oauth_authorize;
    Url::parse_with_params(
        endpoint,
        &[
            ("response_type", "code"),
            ("client_id", client_id(config)?),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|source| OAuthError::InvalidEndpoint {
        url: endpoint.clone(),
        source,
    })
}

/// Exchanges an authorization code for a bearer token.
///
/// Not retried: a code is single-use, so a second attempt after a lost
/// response would fail with `invalid_grant` anyway.
pub async fn exchange_code(
    client: &ApiClient,
    config: &Config,
    code: &str,
) -> Result<Credential, OAuthError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(OAuthError::EmptyCode);
    }
    let client_secret = config
        .google_client_secret
        .as_deref()
        .ok_or(OAuthError::NotConfigured("GOOGLE_CLIENT_SECRET"))?;

    let form = [
        ("code", code),
        ("client_id", client_id(config)?),
        ("client_secret", client_secret),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];
    let response: TokenResponse = client
        .send_json(client.post(&client.endpoints().oauth_token).form(&form))
        .await?;

    let token = response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(OAuthError::MissingAccessToken)?;
    let credential = Credential::new(token);
    log::info!(
        "oauth: obtained access token {credential} (expires in {}s)",
        response.expires_in.unwrap_or_default()
    );
    Ok(credential)
}
