//! Domain registration data over RDAP.
//!
//! RDAP is the JSON successor of port-43 WHOIS. Lookups go through an RDAP
//! bootstrap service, which redirects to the authoritative registry server.

mod parse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Section, Source, SourceInput, SourceName};
use crate::domain::registrable_domain;
use crate::error_handling::SourceError;
use crate::fetch::{ApiClient, RetryPolicy};
use crate::outcome::SourceResult;

use parse::{convert_rdap, RdapDomain};

/// Registration data for one domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WhoisRecord {
    pub domain_name: String,
    pub registrar: Option<String>,
    pub registrant: Option<Contact>,
    pub admin: Option<Contact>,
    pub tech: Option<Contact>,
    pub creation_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
    pub name_servers: Vec<String>,
    /// EPP status values, e.g. "client transfer prohibited"
    pub status: Vec<String>,
    /// Every contact email found, sorted and deduplicated
    pub emails: Vec<String>,
    pub abuse_email: Option<String>,
    pub abuse_phone: Option<String>,
}

/// A registration contact. Most fields are redacted by registries for
/// privacy, so all of them are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country: Option<String>,
}

impl Contact {
    fn is_blank(&self) -> bool {
        self.name.is_none()
            && self.organization.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.country.is_none()
    }
}

/// RDAP adapter.
pub struct Whois {
    client: ApiClient,
    policy: RetryPolicy,
}

impl Whois {
    pub fn new(client: ApiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Looks up the registrable domain of `host`.
    pub async fn lookup(&self, host: &str) -> SourceResult<WhoisRecord> {
        let domain = registrable_domain(host);
        let url = format!("{}/domain/{}", self.client.endpoints().rdap, domain);
        log::info!("whois: looking up {domain}");

        let label = format!("whois {domain}");
        let response: Result<RdapDomain, SourceError> = self
            .policy
            .execute(&label, || {
                self.client.send_json(
                    self.client
                        .get(&url)
                        .header(reqwest::header::ACCEPT, "application/rdap+json"),
                )
            })
            .await;

        match response {
            Ok(rdap) => SourceResult::success(convert_rdap(rdap, &domain)),
            Err(SourceError::Upstream { status: 404, .. }) => {
                SourceResult::empty(format!("no registration data for {domain}"))
            }
            Err(e) => {
                log::warn!("whois: {domain}: {e}");
                e.into()
            }
        }
    }
}

#[async_trait]
impl Source for Whois {
    fn name(&self) -> SourceName {
        SourceName::Whois
    }

    async fn collect(&self, input: &SourceInput) -> SourceResult<Section> {
        let target = match input.require_target() {
            Ok(target) => target,
            Err(empty) => return empty,
        };
        self.lookup(&target.host).await.map(Section::Whois)
    }
}
