//! Free-text block dialect of the IANA root server (also used, with small
//! variations, by several national registries).

use super::{normalize_referral, parse_date, setter_for, split_label};
use crate::record::{Contact, DomainRecord, FieldValue, Nameserver};

const DATE_FORMAT: &str = "%Y-%m-%d";

type RecordSetter = fn(&mut DomainRecord, &str);
type ContactSetter = fn(&mut Contact, &str);

static RECORD_FIELDS: &[(&str, RecordSetter)] = &[
    ("created", |r, v| r.created_date = parse_date(v, DATE_FORMAT)),
    ("changed", |r, v| r.updated_date = parse_date(v, DATE_FORMAT)),
    ("whois", |r, v| r.whois_server = normalize_referral(v)),
    ("refer", |r, v| {
        if r.whois_server.is_none() {
            r.whois_server = normalize_referral(v);
        }
    }),
    ("domain", |r, v| r.domain_name_ext = Some(v.to_lowercase())),
    ("status", |r, v| r.status = Some(v.to_string())),
];

static CONTACT_FIELDS: &[(&str, ContactSetter)] = &[
    ("name", |c, v| c.name = Some(v.to_string())),
    ("organisation", |c, v| c.organization = Some(v.to_string())),
    ("organization", |c, v| c.organization = Some(v.to_string())),
    ("phone", |c, v| c.telephone = Some(v.to_string())),
    ("fax-no", |c, v| c.fax = Some(v.to_string())),
    ("e-mail", |c, v| c.email = Some(v.to_string())),
];

/// Labels of one blank-line delimited block, in first-seen order.
#[derive(Debug, Default)]
struct Group {
    fields: Vec<(String, FieldValue)>,
}

impl Group {
    fn get(&self, label: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(key, _)| key == label).map(|(_, value)| value)
    }

    fn append(&mut self, label: &str, value: &str) {
        match self.fields.iter_mut().find(|(key, _)| key == label) {
            Some((_, existing)) => existing.push(value.to_string()),
            None => self.fields.push((label.to_string(), FieldValue::Single(value.to_string()))),
        }
    }

    fn continue_field(&mut self, label: &str, line: &str) {
        let target = self.fields.iter_mut().find(|(key, _)| key == label).map(|(_, value)| value);
        let last = match target {
            Some(FieldValue::Single(value)) => value,
            Some(FieldValue::Multiple(values)) => match values.last_mut() {
                Some(value) => value,
                None => return,
            },
            None => return,
        };
        last.push('\n');
        last.push_str(line);
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn groups(raw: &str) -> Vec<Group> {
    let mut groups = vec![Group::default()];
    let mut previous: Option<String> = None;

    for line in raw.lines() {
        if line.starts_with('%') || line.starts_with('*') {
            previous = None;
            continue;
        }

        let Some(group) = groups.last_mut() else { break };

        if !line.trim().is_empty() {
            if let Some((label, value)) = split_label(line) {
                group.append(label, value);
                previous = Some(label.to_string());
            } else if let Some(label) = &previous {
                group.continue_field(label, line.trim());
            }
        } else if !group.is_empty() {
            previous = None;
            groups.push(Group::default());
        }
    }

    if groups.last().is_some_and(Group::is_empty) {
        groups.pop();
    }
    groups
}

fn contact_from(group: &Group) -> Contact {
    let mut contact = Contact::default();
    let mut address = Vec::new();

    for (label, value) in &group.fields {
        if label == "address" {
            address.extend(value.values().iter().flat_map(|v| v.lines()).map(str::to_string));
        } else if let Some(set) = setter_for(CONTACT_FIELDS, label) {
            set(&mut contact, value.last());
        }
    }

    // The final address line names the country.
    if address.len() > 1 {
        contact.country = address.pop();
    }
    for line in address {
        contact.push_street(line);
    }
    contact
}

pub fn parse(raw: &str) -> Option<DomainRecord> {
    if raw.contains("returned 0 objects") || raw.contains("No match found") {
        return None;
    }

    let mut record = DomainRecord::new(raw);

    for group in groups(raw) {
        let role = group.get("contact").map(|v| v.last().to_string());
        let has_org = group.get("organisation").is_some() || group.get("organization").is_some();

        if role.is_some() || has_org {
            let contact = contact_from(&group);
            match role.as_deref() {
                Some("administrative") => record.admin = Some(contact),
                Some("technical") => record.tech = Some(contact),
                Some("billing") => record.billing = Some(contact),
                Some("zone") => record.zone = Some(contact),
                Some(_) => {}
                None => record.registrant = Some(contact),
            }
            continue;
        }

        for (label, value) in &group.fields {
            if let Some(set) = setter_for(RECORD_FIELDS, label) {
                set(&mut record, value.last());
            } else if label == "nserver" {
                let tokens = value.values().join(" ");
                record.push_nameservers(Nameserver::classify_all(&tokens));
            } else {
                for v in value.values() {
                    record.add_custom_field(label.as_str(), v);
                }
            }
        }
    }

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NameserverKind;
    use chrono::Datelike;

    const COM_RESPONSE: &str = "\
% IANA WHOIS server
% for more information on IANA, visit http://www.iana.org
% This query returned 1 object

refer:        whois.verisign-grs.com

domain:       COM

organisation: VeriSign Global Registry Services
address:      12061 Bluemont Way
address:      Reston VA 20190
address:      United States of America (the)

contact:      administrative
name:         Registry Customer Service
organisation: VeriSign Global Registry Services
address:      12061 Bluemont Way
address:      Reston VA 20190
address:      United States of America (the)
phone:        +1 703 925-6999
fax-no:       +1 703 948 3978
e-mail:       info@verisign-grs.com

contact:      technical
name:         Registry Customer Service
organisation: VeriSign Global Registry Services
e-mail:       info@verisign-grs.com

nserver:      A.GTLD-SERVERS.NET 192.5.6.30 2001:503:a83e:0:0:0:2:30
nserver:      B.GTLD-SERVERS.NET 192.33.14.30 2001:503:231d:0:0:0:2:30
ds-rdata:     19718 13 2 8acbb0cd28f41250a80a491389424d341522d946b0da0c0291f2d3d771d7805a

whois:        whois.verisign-grs.com

status:       ACTIVE
remarks:      Registration information: http://www.verisigninc.com

created:      1985-01-01
changed:      2023-12-07
source:       IANA
";

    #[test]
    fn test_parse_tld_referral() {
        let record = parse(COM_RESPONSE).unwrap();
        assert_eq!(record.whois_server.as_deref(), Some("whois.verisign-grs.com"));
        assert_eq!(record.domain_name_ext.as_deref(), Some("com"));
        assert_eq!(record.status.as_deref(), Some("ACTIVE"));
        assert_eq!(record.created_date.unwrap().year(), 1985);
        assert_eq!(record.updated_date.unwrap().year(), 2023);
        assert_eq!(record.raw, COM_RESPONSE);
    }

    #[test]
    fn test_contacts_by_role() {
        let record = parse(COM_RESPONSE).unwrap();

        let registrant = record.registrant.unwrap();
        assert_eq!(registrant.organization.as_deref(), Some("VeriSign Global Registry Services"));
        assert_eq!(registrant.street1.as_deref(), Some("12061 Bluemont Way"));
        assert_eq!(registrant.street2.as_deref(), Some("Reston VA 20190"));
        assert_eq!(registrant.country.as_deref(), Some("United States of America (the)"));

        let admin = record.admin.unwrap();
        assert_eq!(admin.name.as_deref(), Some("Registry Customer Service"));
        assert_eq!(admin.telephone.as_deref(), Some("+1 703 925-6999"));
        assert_eq!(admin.fax.as_deref(), Some("+1 703 948 3978"));
        assert_eq!(admin.email.as_deref(), Some("info@verisign-grs.com"));

        assert!(record.tech.is_some());
    }

    #[test]
    fn test_zone_contact_kept_apart() {
        let raw = "\
domain:       EXAMPLE.ARPA

contact:      zone
name:         Zone Administrator
organisation: Example Zone Operator
e-mail:       zone@example.arpa

contact:      secretarial
name:         Ignored Role
";
        let record = parse(raw).unwrap();
        let zone = record.zone.unwrap();
        assert_eq!(zone.name.as_deref(), Some("Zone Administrator"));
        assert_eq!(zone.organization.as_deref(), Some("Example Zone Operator"));
        assert_eq!(zone.email.as_deref(), Some("zone@example.arpa"));
        assert!(record.registrant.is_none());
        assert!(record.admin.is_none());
        assert!(record.tech.is_none());
    }

    #[test]
    fn test_nameserver_tokens_classified() {
        let record = parse(COM_RESPONSE).unwrap();
        let servers = record.nameservers.unwrap();
        assert_eq!(servers.len(), 6);
        assert_eq!(servers[0].value, "a.gtld-servers.net");
        assert_eq!(servers[1].kind, NameserverKind::Ipv4);
        assert_eq!(servers[2].kind, NameserverKind::Ipv6);
        assert_eq!(servers[3].value, "b.gtld-servers.net");
    }

    #[test]
    fn test_unknown_labels_go_to_custom_fields() {
        let record = parse(COM_RESPONSE).unwrap();
        assert_eq!(record.custom_fields["source"], FieldValue::Single("IANA".into()));
        assert_eq!(
            record.custom_fields["remarks"],
            FieldValue::Single("Registration information: http://www.verisigninc.com".into())
        );
        assert!(record.custom_fields.contains_key("ds-rdata"));
    }

    #[test]
    fn test_no_objects_is_none() {
        let raw = "% IANA WHOIS server\n% This query returned 0 objects.\n";
        assert!(parse(raw).is_none());
    }

    #[test]
    fn test_continuation_and_comment_lines() {
        let raw = "remarks: first line\n  second line\n% comment\n  orphan line\nsource: TEST\n";
        let record = parse(raw).unwrap();
        assert_eq!(
            record.custom_fields["remarks"],
            FieldValue::Single("first line\nsecond line".into())
        );
        assert_eq!(record.custom_fields["source"], FieldValue::Single("TEST".into()));
    }

    #[test]
    fn test_repeated_custom_keys_keep_order_and_duplicates() {
        let raw = "remarks: a\nremarks: b\n\nremarks: a\n";
        let record = parse(raw).unwrap();
        assert_eq!(
            record.custom_fields["remarks"],
            FieldValue::Multiple(vec!["a".into(), "b".into(), "a".into()])
        );
    }

    #[test]
    fn test_groups_split_on_blank_lines_only() {
        let groups = groups("a: 1\n% note\nb: 2\n\n\nc: 3\n");
        assert_eq!(groups.len(), 2);
        assert!(groups[0].get("b").is_some());
        assert!(groups[1].get("c").is_some());
    }
}
