//! Site identifier normalization.
//!
//! This module turns the many ways a site can be named (bare domain, full
//! URL, Search Console `sc-domain:` property) into the forms the adapters
//! need:
//! - `extract_host()` - host (and port) for news, SSL and WHOIS inputs
//! - `registrable_domain()` - the PSL registrable domain of a host
//! - `SiteTarget::parse()` - a validated `scheme://host[:port]` target

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Search Console prefix for domain-level properties.
pub const SC_DOMAIN_PREFIX: &str = "sc-domain:";

/// Extracts the bare host from a site identifier.
///
/// - `sc-domain:example.com` → `example.com`
/// - `https://www.example.com:8443/path` → `www.example.com:8443`
/// - anything that does not parse as a URL with a host is returned unchanged
///
/// Never fails.
pub fn extract_host(site: &str) -> String {
    if let Some(domain) = site.strip_prefix(SC_DOMAIN_PREFIX) {
        return domain.to_string();
    }

    match Url::parse(site) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) if !host.is_empty() => format!("{host}:{port}"),
            (Some(host), None) if !host.is_empty() => host.to_string(),
            _ => site.to_string(),
        },
        Err(_) => site.to_string(),
    }
}

/// Returns the registrable domain (e.g. `example.co.uk` for
/// `www.shop.example.co.uk`), or the host itself for IP addresses, single
/// labels, and hosts the Public Suffix List does not cover.
///
/// A `:port` suffix is ignored.
pub fn registrable_domain(host: &str) -> String {
    let host = strip_port(host).trim_end_matches('.').to_ascii_lowercase();
    if host.parse::<IpAddr>().is_ok() || host.starts_with('[') {
        return host;
    }
    psl::domain_str(&host)
        .map(str::to_string)
        .unwrap_or(host)
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 keeps its colons
    if host.starts_with('[') {
        return host.split_once(']').map_or(host, |(ip, _)| &host[..ip.len() + 1]);
    }
    host.split_once(':').map_or(host, |(name, _)| name)
}

/// Errors turning user input into a [`SiteTarget`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("target cannot be empty")]
    Empty,

    #[error("'{input}' is not a valid URL: {reason}")]
    Invalid { input: String, reason: String },

    #[error("'{0}' has no host")]
    MissingHost(String),

    #[error("unsupported scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

/// A normalized site to report on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteTarget {
    /// `scheme://host[:port]`, no path, no trailing slash
    pub url: String,
    /// Host with optional port
    pub host: String,
}

impl SiteTarget {
    /// Normalizes user input.
    ///
    /// - `sc-domain:example.com` → `https://www.example.com`
    /// - `example.com/some/page` → `https://example.com`
    /// - `http://Example.com:8080/x?y` → `http://example.com:8080`
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TargetError::Empty);
        }

        let candidate = if let Some(domain) = input.strip_prefix(SC_DOMAIN_PREFIX) {
            let domain = domain.trim();
            if domain.is_empty() {
                return Err(TargetError::Empty);
            }
            if domain.starts_with("www.") {
                format!("https://{domain}")
            } else {
                format!("https://www.{domain}")
            }
        } else if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{input}")
        };

        let parsed = Url::parse(&candidate).map_err(|e| TargetError::Invalid {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        }

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(TargetError::MissingHost(input.to_string())),
        };
        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            url: format!("{}://{}", parsed.scheme(), host),
            host,
        })
    }

    /// Host without the port, as SSL Labs expects it.
    pub fn hostname(&self) -> &str {
        strip_port(&self.host)
    }

    /// Registrable domain, the keyword for WHOIS, news and trends.
    pub fn domain(&self) -> String {
        registrable_domain(&self.host)
    }
}

impl fmt::Display for SiteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
