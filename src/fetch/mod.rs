//! HTTP plumbing shared by the source adapters.
//!
//! This module provides:
//! - [`ApiClient`]: the injected HTTP client plus upstream base URLs
//! - [`RetryPolicy`]: bounded, iterative retry with exponential or fixed backoff
//! - Response decoding that turns every non-2xx or undecodable body into a
//!   [`SourceError`]

mod request;
mod retry;

use std::sync::Arc;
use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::config::{Config, Endpoints};
use crate::credential::Credential;
use crate::error_handling::{
    categorize_reqwest_error, categorize_status, truncate_message, InitializationError, SourceError,
};
use crate::initialization::init_client;

pub(crate) use request::BrowserHeaders;
pub use retry::{Backoff, RetryPolicy};

/// HTTP client handed to every adapter of one pipeline run.
///
/// Cloning shares the underlying connection pool and endpoint table.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: Arc<Endpoints>,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, endpoints: Endpoints, request_timeout: Duration) -> Self {
        Self {
            http,
            endpoints: Arc::new(endpoints),
            request_timeout,
        }
    }

    /// Builds a client from the configured user agent, timeouts and endpoints.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        Ok(Self::new(
            init_client(config)?,
            config.endpoints.clone(),
            Duration::from_secs(config.timeout_seconds),
        ))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// GET with a bearer token.
    pub fn get_authorized(&self, url: &str, credential: &Credential) -> RequestBuilder {
        self.http.get(url).bearer_auth(credential.secret())
    }

    /// POST with a bearer token.
    pub fn post_authorized(&self, url: &str, credential: &Credential) -> RequestBuilder {
        self.http.post(url).bearer_auth(credential.secret())
    }

    /// Sends the request and returns the body of a 2xx response.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e, self.request_timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        log::debug!("{} {}", status.as_u16(), response.url());

        let body = response
            .text()
            .await
            .map_err(|e| categorize_reqwest_error(&e, self.request_timeout))?;

        if !status.is_success() {
            return Err(categorize_status(status, &headers, &body));
        }
        Ok(body)
    }

    /// Sends the request and decodes a 2xx JSON body into `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SourceError> {
        let body = self.send_text(request).await?;
        decode_json(&body)
    }
}

/// Decodes a JSON body, reporting the serde error as a malformed response.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Malformed(truncate_message(&e.to_string())))
}
