//! RDAP domain objects (RFC 9083) with jCard entities (RFC 7095).

use super::parse_iso_date;
use crate::domain::SuffixList;
use crate::record::{Contact, DomainRecord, Nameserver};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RdapDomain {
    error_code: Option<u16>,
    ldh_name: Option<String>,
    events: Vec<Event>,
    nameservers: Vec<RdapNameserver>,
    entities: Vec<Entity>,
    status: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Event {
    event_action: String,
    event_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RdapNameserver {
    object_class_name: String,
    ldh_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Entity {
    roles: Vec<String>,
    public_ids: Vec<PublicId>,
    vcard_array: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PublicId {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

impl Entity {
    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// One `[name, params, type, value]` entry of a jCard.
struct VcardProperty<'a> {
    name: &'a str,
    params: &'a Value,
    value: &'a Value,
}

fn vcard_properties(vcard: &Value) -> Vec<VcardProperty<'_>> {
    let Some(array) = vcard.as_array() else { return Vec::new() };
    if array.first().and_then(Value::as_str) != Some("vcard") {
        return Vec::new();
    }
    array
        .get(1)
        .and_then(Value::as_array)
        .map(|props| {
            props
                .iter()
                .filter_map(|prop| {
                    let prop = prop.as_array()?;
                    Some(VcardProperty {
                        name: prop.first()?.as_str()?,
                        params: prop.get(1)?,
                        value: prop.get(3)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Non-empty strings of a jCard value that may be a string or a list.
fn texts(value: &Value) -> Vec<&str> {
    let values: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    values.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn text(value: &Value) -> Option<String> {
    let parts = texts(value);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn is_fax(params: &Value) -> bool {
    texts(&params["type"]).iter().any(|t| t.eq_ignore_ascii_case("fax"))
}

fn set_address(contact: &mut Contact, value: &Value) {
    let Some(parts) = value.as_array() else { return };
    let component = |i: usize| parts.get(i).and_then(text);

    // Street address first, then the extended address line.
    for index in [2, 1] {
        if let Some(line) = parts.get(index) {
            for street in texts(line) {
                contact.push_street(street);
            }
        }
    }
    contact.city = component(3);
    contact.state = component(4);
    contact.postal_code = component(5);
    match component(6) {
        Some(country) if country.len() == 2 => contact.country_code = Some(country.to_uppercase()),
        country => contact.country = country,
    }
}

fn contact_from(entity: &Entity) -> Contact {
    let mut contact = Contact::default();

    for prop in vcard_properties(&entity.vcard_array) {
        match prop.name {
            "fn" => contact.name = text(prop.value),
            "org" => contact.organization = text(prop.value),
            "adr" => set_address(&mut contact, prop.value),
            "email" => contact.email = text(prop.value),
            "tel" => {
                let number = text(prop.value).map(|n| n.trim_start_matches("tel:").to_string());
                if is_fax(prop.params) {
                    contact.fax = number;
                } else {
                    contact.telephone = number;
                }
            }
            _ => {}
        }
    }
    contact
}

fn apply_registrar(record: &mut DomainRecord, entity: &Entity) {
    record.registrar_iana_id = entity
        .public_ids
        .iter()
        .find(|id| id.kind == "IANA Registrar ID")
        .map(|id| id.identifier.trim().to_string())
        .filter(|id| !id.is_empty());

    record.registrar_name = vcard_properties(&entity.vcard_array)
        .into_iter()
        .find(|prop| prop.name == "fn")
        .and_then(|prop| text(prop.value));
}

pub fn parse(raw: &str, psl: &SuffixList) -> Option<DomainRecord> {
    let data: RdapDomain = match serde_json::from_str(raw) {
        Ok(data) => data,
        Err(e) => {
            debug!("Discarding RDAP response that is not a domain object: {}", e);
            return None;
        }
    };

    match data.error_code {
        Some(404) => return Some(DomainRecord::available(raw)),
        Some(code) => {
            debug!("RDAP error object with code {}", code);
            return None;
        }
        None => {}
    }

    if data.ldh_name.is_none() && data.events.is_empty() {
        return None;
    }

    let mut record = DomainRecord::new(raw);
    record.status = Some("registered".to_string());
    record.domain_availability = Some(false);

    for event in &data.events {
        let date = parse_iso_date(&event.event_date);
        match event.event_action.as_str() {
            "registration" => record.created_date = date,
            "expiration" => record.expires_date = date,
            "last changed" => record.updated_date = date,
            _ => {}
        }
    }

    let nameservers: Vec<Nameserver> = data
        .nameservers
        .iter()
        .filter(|ns| ns.object_class_name == "nameserver")
        .filter_map(|ns| ns.ldh_name.as_deref())
        .map(Nameserver::classify)
        .collect();
    if !nameservers.is_empty() {
        record.nameservers = Some(nameservers);
    }

    for entity in &data.entities {
        if entity.has_role("registrar") {
            apply_registrar(&mut record, entity);
            continue;
        }

        let contact = contact_from(entity);
        if contact.is_empty() {
            continue;
        }
        let slot = if entity.has_role("registrant") {
            &mut record.registrant
        } else if entity.has_role("administrative") {
            &mut record.admin
        } else if entity.has_role("technical") {
            &mut record.tech
        } else if entity.has_role("billing") {
            &mut record.billing
        } else {
            continue;
        };
        *slot = Some(contact);
    }

    for status in &data.status {
        record.add_custom_field("status", status.as_str());
    }

    if let Some(name) = data.ldh_name.as_deref() {
        match psl.split(name) {
            Some((label, ext)) => {
                record.domain_name = Some(label);
                record.domain_name_ext = Some(ext);
            }
            None => record.domain_name = Some(name.to_lowercase()),
        }
    }

    Some(record)
}
