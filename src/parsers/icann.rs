//! `Key: Value` dialect mandated for gTLD registries (Verisign, PIR, CentralNic).

use super::{normalize_referral, parse_iso_date, setter_for, split_label};
use crate::domain::SuffixList;
use crate::record::{Contact, DomainRecord, FieldValue, Nameserver};
use std::sync::Arc;

type RecordSetter = fn(&mut DomainRecord, &str);
type ContactSetter = fn(&mut Contact, &str);

static RECORD_FIELDS: &[(&str, RecordSetter)] = &[
    ("Registrar", |r, v| r.registrar_name = Some(v.to_string())),
    ("Sponsoring Registrar", |r, v| r.registrar_name = Some(v.to_string())),
    ("Registrar IANA ID", |r, v| r.registrar_iana_id = Some(v.to_string())),
    ("Sponsoring Registrar IANA ID", |r, v| r.registrar_iana_id = Some(v.to_string())),
    ("Registrar WHOIS Server", |r, v| r.whois_server = normalize_referral(v)),
    ("Registrar URL", |r, v| r.add_custom_field("registrarURL", v)),
    ("Updated Date", |r, v| r.updated_date = parse_iso_date(v)),
    ("Creation Date", |r, v| r.created_date = parse_iso_date(v)),
    ("Registry Expiry Date", |r, v| r.expires_date = parse_iso_date(v)),
    ("Registrar Registration Expiration Date", |r, v| {
        if r.expires_date.is_none() {
            r.expires_date = parse_iso_date(v);
        }
    }),
    ("Name Server", |r, v| r.push_nameservers(Nameserver::classify_all(v))),
];

static CONTACT_FIELDS: &[(&str, ContactSetter)] = &[
    ("Name", |c, v| c.name = Some(v.to_string())),
    ("Organization", |c, v| c.organization = Some(v.to_string())),
    ("Street", |c, v| c.push_street(v)),
    ("City", |c, v| c.city = Some(v.to_string())),
    ("State/Province", |c, v| c.state = Some(v.to_string())),
    ("Postal Code", |c, v| c.postal_code = Some(v.to_string())),
    ("Country", |c, v| c.country_code = Some(v.to_string())),
    ("Email", |c, v| c.email = Some(v.to_string())),
    ("Phone", |c, v| c.telephone = Some(v.to_string())),
    ("Phone Ext", |c, v| c.telephone_ext = Some(v.to_string())),
    ("Fax", |c, v| c.fax = Some(v.to_string())),
    ("Fax Ext", |c, v| c.fax_ext = Some(v.to_string())),
];

#[derive(Clone, Copy)]
enum Role {
    Registrant,
    Admin,
    Tech,
    Billing,
}

const ROLE_PREFIXES: [(&str, Role); 4] = [
    ("Registrant ", Role::Registrant),
    ("Admin ", Role::Admin),
    ("Tech ", Role::Tech),
    ("Billing ", Role::Billing),
];

const QUOTA_MARKERS: [&str; 2] = ["WHOIS LIMIT EXCEEDED", "Query rate limit exceeded"];

/// Labels up to the `>>>` footer, repeated labels collected in order.
fn entries(raw: &str) -> Vec<(String, FieldValue)> {
    let mut entries: Vec<(String, FieldValue)> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.starts_with(">>>") {
            break;
        }
        let Some((label, value)) = split_label(line) else { continue };
        if label.is_empty() || value.is_empty() {
            continue;
        }
        match entries.iter_mut().find(|(key, _)| key == label) {
            Some((_, existing)) => existing.push(value.to_string()),
            None => entries.push((label.to_string(), FieldValue::Single(value.to_string()))),
        }
    }
    entries
}

/// One parser configuration per registry family; only the "not found"
/// wording differs between them.
pub struct IcannParser {
    psl: Arc<SuffixList>,
    not_found: &'static [&'static str],
}

impl IcannParser {
    pub fn new(psl: Arc<SuffixList>, not_found: &'static [&'static str]) -> Self {
        Self { psl, not_found }
    }

    pub fn verisign(psl: Arc<SuffixList>) -> Self {
        Self::new(psl, &["No match for"])
    }

    pub fn pir(psl: Arc<SuffixList>) -> Self {
        Self::new(psl, &["Domain not found", "NOT FOUND"])
    }

    pub fn centralnic(psl: Arc<SuffixList>) -> Self {
        Self::new(psl, &["DOMAIN NOT FOUND", "No match for"])
    }

    pub fn parse(&self, raw: &str) -> Option<DomainRecord> {
        if QUOTA_MARKERS.iter().any(|marker| raw.contains(marker)) {
            return None;
        }

        let head = raw.trim_start();
        if self.not_found.iter().any(|marker| head.starts_with(marker)) {
            return Some(DomainRecord::available(raw));
        }

        // Error banners like "Error: connection limit reached" still split
        // into a label, so only a response naming the domain is a record.
        let entries = entries(raw);
        if !entries.iter().any(|(label, _)| label == "Domain Name") {
            return None;
        }

        let mut record = DomainRecord::new(raw);
        record.status = Some("registered".to_string());
        record.domain_availability = Some(false);

        let mut contacts: [Contact; 4] = Default::default();

        for (label, value) in &entries {
            if label == "Domain Name" {
                self.set_domain_name(&mut record, value.last());
            } else if let Some(set) = setter_for(RECORD_FIELDS, label) {
                for v in value.values() {
                    set(&mut record, v);
                }
            } else if let Some((role, set)) = contact_setter(label) {
                for v in value.values() {
                    set(&mut contacts[role as usize], v);
                }
            } else {
                for v in value.values() {
                    record.add_custom_field(label.as_str(), v);
                }
            }
        }

        let [registrant, admin, tech, billing] = contacts;
        record.registrant = Some(registrant).filter(|c| !c.is_empty());
        record.admin = Some(admin).filter(|c| !c.is_empty());
        record.tech = Some(tech).filter(|c| !c.is_empty());
        record.billing = Some(billing).filter(|c| !c.is_empty());

        Some(record)
    }

    fn set_domain_name(&self, record: &mut DomainRecord, name: &str) {
        match self.psl.split(name) {
            Some((label, ext)) => {
                record.domain_name = Some(label);
                record.domain_name_ext = Some(ext);
            }
            None => record.domain_name = Some(name.to_lowercase()),
        }
    }
}

fn contact_setter(label: &str) -> Option<(Role, ContactSetter)> {
    ROLE_PREFIXES.iter().find_map(|(prefix, role)| {
        let field = label.strip_prefix(prefix)?;
        setter_for(CONTACT_FIELDS, field).map(|set| (*role, set))
    })
}
