//! RDAP response parsing.
//!
//! RDAP contacts are jCard arrays (`["vcard", [[name, params, type, value], ...]]`),
//! which do not map onto a fixed struct, so entities are walked as JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{Contact, WhoisRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RdapDomain {
    #[serde(default)]
    ldh_name: Option<String>,
    #[serde(default)]
    unicode_name: Option<String>,
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    events: Vec<RdapEvent>,
    #[serde(default)]
    nameservers: Vec<RdapNameserver>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEvent {
    event_action: String,
    #[serde(default)]
    event_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapNameserver {
    #[serde(default)]
    ldh_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEntity {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    vcard_array: Option<Value>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
}

/// Converts an RDAP domain object into a [`WhoisRecord`].
pub(crate) fn convert_rdap(domain: RdapDomain, queried: &str) -> WhoisRecord {
    let mut record = WhoisRecord {
        domain_name: domain
            .ldh_name
            .or(domain.unicode_name)
            .map(|name| name.to_ascii_lowercase())
            .unwrap_or_else(|| queried.to_string()),
        status: domain.status,
        name_servers: domain
            .nameservers
            .into_iter()
            .filter_map(|ns| ns.ldh_name)
            .map(|name| name.to_ascii_lowercase())
            .collect(),
        ..Default::default()
    };

    for event in &domain.events {
        let date = event.event_date.as_deref().and_then(parse_date_string);
        match event.event_action.as_str() {
            "registration" => record.creation_date = record.creation_date.or(date),
            "expiration" => record.expiration_date = record.expiration_date.or(date),
            "last changed" => record.updated_date = record.updated_date.or(date),
            _ => {}
        }
    }

    collect_entities(&domain.entities, &mut record);
    record.emails.sort();
    record.emails.dedup();
    record
}

fn collect_entities(entities: &[RdapEntity], record: &mut WhoisRecord) {
    for entity in entities {
        let contact = entity.vcard_array.as_ref().map(parse_vcard).unwrap_or_default();
        if let Some(email) = &contact.email {
            record.emails.push(email.clone());
        }

        for role in &entity.roles {
            match role.as_str() {
                "registrar" => {
                    if record.registrar.is_none() {
                        record.registrar = contact.name.clone().or(contact.organization.clone());
                    }
                }
                "registrant" => set_once(&mut record.registrant, &contact),
                "administrative" => set_once(&mut record.admin, &contact),
                "technical" => set_once(&mut record.tech, &contact),
                "abuse" => {
                    record.abuse_email = record.abuse_email.take().or(contact.email.clone());
                    record.abuse_phone = record.abuse_phone.take().or(contact.phone.clone());
                }
                _ => {}
            }
        }

        collect_entities(&entity.entities, record);
    }
}

fn set_once(slot: &mut Option<Contact>, contact: &Contact) {
    if slot.is_none() && !contact.is_blank() {
        *slot = Some(contact.clone());
    }
}

/// Reads the fields we report from a jCard.
fn parse_vcard(vcard: &Value) -> Contact {
    let mut contact = Contact::default();
    let Some(properties) = vcard.get(1).and_then(Value::as_array) else {
        return contact;
    };

    for property in properties {
        let Some(name) = property.get(0).and_then(Value::as_str) else {
            continue;
        };
        let value = property.get(3);
        let text = value
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match name {
            "fn" => contact.name = contact.name.take().or(text),
            "org" => {
                let org = text.or_else(|| {
                    value
                        .and_then(Value::as_array)
                        .and_then(|parts| parts.first())
                        .and_then(Value::as_str)
                        .map(str::to_string)
                });
                contact.organization = contact.organization.take().or(org);
            }
            "email" => contact.email = contact.email.take().or(text),
            "tel" => {
                let phone = text.map(|t| t.trim_start_matches("tel:").to_string());
                contact.phone = contact.phone.take().or(phone);
            }
            "adr" => {
                let from_params = property
                    .get(1)
                    .and_then(|params| params.get("cc"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let from_value = value
                    .and_then(Value::as_array)
                    .and_then(|parts| parts.get(6))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                contact.country = contact.country.take().or(from_params).or(from_value);
            }
            _ => {}
        }
    }
    contact
}

/// Attempts to parse a date string in the formats registries use.
pub(crate) fn parse_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive.and_utc());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d/%m/%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
