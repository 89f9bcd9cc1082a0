//! Canonical output shape shared by every parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone_ext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax_ext: Option<String>,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        *self == Contact::default()
    }

    /// Fill the next free street slot; lines beyond the fourth are dropped.
    pub fn push_street(&mut self, line: impl Into<String>) {
        let slot = [&mut self.street1, &mut self.street2, &mut self.street3, &mut self.street4]
            .into_iter()
            .find(|s| s.is_none());
        if let Some(slot) = slot {
            *slot = Some(line.into());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameserverKind {
    Ipv4,
    Ipv6,
    Hostname,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nameserver {
    #[serde(rename = "type")]
    pub kind: NameserverKind,
    pub value: String,
}

impl Nameserver {
    /// Classify a raw token by literal form only.
    pub fn classify(token: &str) -> Self {
        let token = token.trim();
        if token.parse::<Ipv4Addr>().is_ok() {
            Self { kind: NameserverKind::Ipv4, value: token.to_string() }
        } else if token.parse::<Ipv6Addr>().is_ok() {
            Self { kind: NameserverKind::Ipv6, value: token.to_string() }
        } else {
            Self {
                kind: NameserverKind::Hostname,
                value: token.trim_end_matches('.').to_lowercase(),
            }
        }
    }

    /// Classify every whitespace-separated token in `text`.
    pub fn classify_all(text: &str) -> Vec<Self> {
        text.split_whitespace().map(Self::classify).collect()
    }
}

/// A custom field keeps a scalar until its key repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    pub fn push(&mut self, value: String) {
        match self {
            FieldValue::Single(first) => {
                let first = std::mem::take(first);
                *self = FieldValue::Multiple(vec![first, value]);
            }
            FieldValue::Multiple(values) => values.push(value),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(v) => vec![v.as_str()],
            FieldValue::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Last value, which is what a scalar setter sees for a repeated key.
    pub fn last(&self) -> &str {
        match self {
            FieldValue::Single(v) => v,
            FieldValue::Multiple(vs) => vs.last().map(String::as_str).unwrap_or(""),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_ext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_availability: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<Nameserver>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_name: Option<String>,
    #[serde(rename = "registrarIANAID", skip_serializing_if = "Option::is_none")]
    pub registrar_iana_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, FieldValue>,
    pub raw: String,
}

impl DomainRecord {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into(), ..Default::default() }
    }

    /// Record for a response that states the domain is not registered.
    pub fn available(raw: impl Into<String>) -> Self {
        Self {
            domain_availability: Some(true),
            status: Some("available".to_string()),
            ..Self::new(raw)
        }
    }

    pub fn is_available(&self) -> bool {
        self.domain_availability == Some(true)
    }

    /// Append to `custom_fields`, turning a repeated key into a list.
    pub fn add_custom_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.custom_fields.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                self.custom_fields.insert(key, FieldValue::Single(value));
            }
        }
    }

    pub fn push_nameservers(&mut self, servers: impl IntoIterator<Item = Nameserver>) {
        self.nameservers.get_or_insert_with(Vec::new).extend(servers);
    }

    /// Overlay a later hop: every field it sets wins, unset fields keep their
    /// earlier value. Custom fields merge key by key.
    pub fn merge(&mut self, later: DomainRecord) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.created_date, later.created_date);
        take(&mut self.updated_date, later.updated_date);
        take(&mut self.expires_date, later.expires_date);
        take(&mut self.registrant, later.registrant);
        take(&mut self.admin, later.admin);
        take(&mut self.billing, later.billing);
        take(&mut self.tech, later.tech);
        take(&mut self.zone, later.zone);
        take(&mut self.domain_name, later.domain_name);
        take(&mut self.domain_name_ext, later.domain_name_ext);
        take(&mut self.domain_availability, later.domain_availability);
        take(&mut self.nameservers, later.nameservers);
        take(&mut self.status, later.status);
        take(&mut self.registrar_name, later.registrar_name);
        take(&mut self.registrar_iana_id, later.registrar_iana_id);
        take(&mut self.whois_server, later.whois_server);
        self.custom_fields.extend(later.custom_fields);
        self.raw = later.raw;

        if self.is_available() {
            self.clear_registration();
        }
    }

    fn clear_registration(&mut self) {
        self.created_date = None;
        self.updated_date = None;
        self.expires_date = None;
        self.registrant = None;
        self.registrar_name = None;
        self.registrar_iana_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nameserver_classification() {
        assert_eq!(Nameserver::classify("192.0.2.1").kind, NameserverKind::Ipv4);
        assert_eq!(Nameserver::classify("2001:db8::1").kind, NameserverKind::Ipv6);

        let host = Nameserver::classify("NS1.EXAMPLE.COM");
        assert_eq!(host.kind, NameserverKind::Hostname);
        assert_eq!(host.value, "ns1.example.com");
    }

    #[test]
    fn test_nameserver_not_fooled_by_partial_ip() {
        assert_eq!(Nameserver::classify("192.0.2").kind, NameserverKind::Hostname);
        assert_eq!(Nameserver::classify("192.0.2.1.example").kind, NameserverKind::Hostname);
    }

    #[test]
    fn test_classify_all_splits_tokens() {
        let servers = Nameserver::classify_all("A.GTLD-SERVERS.NET 192.5.6.30 2001:503:a83e:0:0:0:2:30");
        let kinds: Vec<_> = servers.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![NameserverKind::Hostname, NameserverKind::Ipv4, NameserverKind::Ipv6]);
        assert_eq!(servers[0].value, "a.gtld-servers.net");
    }

    #[test]
    fn test_custom_field_repeats_become_list() {
        let mut record = DomainRecord::new("");
        record.add_custom_field("remarks", "one");
        assert_eq!(record.custom_fields["remarks"], FieldValue::Single("one".into()));

        record.add_custom_field("remarks", "two");
        record.add_custom_field("remarks", "one");
        assert_eq!(
            record.custom_fields["remarks"],
            FieldValue::Multiple(vec!["one".into(), "two".into(), "one".into()])
        );
    }

    #[test]
    fn test_merge_later_hop_wins_and_keeps_earlier_fields() {
        let mut base = DomainRecord::new("registry");
        base.registrar_name = Some("Registry View".into());
        base.status = Some("registered".into());
        base.whois_server = Some("whois.registrar.example".into());

        let mut later = DomainRecord::new("registrar");
        later.registrar_name = Some("Registrar View".into());

        base.merge(later);
        assert_eq!(base.registrar_name.as_deref(), Some("Registrar View"));
        assert_eq!(base.status.as_deref(), Some("registered"));
        assert_eq!(base.whois_server.as_deref(), Some("whois.registrar.example"));
        assert_eq!(base.raw, "registrar");
    }

    #[test]
    fn test_merge_availability_clears_registration() {
        let mut base = DomainRecord::new("registry");
        base.registrar_name = Some("Someone".into());
        base.merge(DomainRecord::available("gone"));
        assert!(base.is_available());
        assert!(base.registrar_name.is_none());
    }

    #[test]
    fn test_push_street_fills_slots_in_order() {
        let mut contact = Contact::default();
        for line in ["a", "b", "c", "d", "e"] {
            contact.push_street(line);
        }
        assert_eq!(contact.street1.as_deref(), Some("a"));
        assert_eq!(contact.street4.as_deref(), Some("d"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut record = DomainRecord::new("raw");
        record.domain_name_ext = Some("com".into());
        record.registrar_iana_id = Some("292".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["domainNameExt"], "com");
        assert_eq!(json["registrarIANAID"], "292");
        assert!(json.get("registrant").is_none());
    }
}
