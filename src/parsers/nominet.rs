//! Indented free-text dialect of `whois.nic.uk`.

use super::parse_date;
use crate::domain::SuffixList;
use crate::record::{Contact, DomainRecord, Nameserver};
use once_cell::sync::Lazy;
use regex::Regex;

const DATE_FORMAT: &str = "%d-%b-%Y";

static DOMAIN_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"Domain name:\s+(.*)").unwrap());
static REGISTRAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Registrar:\s+(.*)(?:\s+URL:\s+(.*))?").unwrap());
static REGISTRAR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)\s*\[Tag = (.+)\]$").unwrap());
static REGISTERED_ON: Lazy<Regex> = Lazy::new(|| Regex::new(r"Registered on:\s+(.+)").unwrap());
static EXPIRY_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Expiry date:\s+(.+)").unwrap());
static LAST_UPDATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"Last updated:\s+(.+)").unwrap());
static STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Registration status:\s+(.+)").unwrap());

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Trimmed lines under `heading` up to the next blank line.
fn block<'a>(text: &'a str, heading: &str) -> Vec<&'a str> {
    text.lines()
        .skip_while(|line| line.trim() != heading)
        .skip(1)
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .collect()
}

fn registrant(text: &str) -> Option<Contact> {
    let name = block(text, "Registrant:");
    let mut address = block(text, "Registrant's address:");
    if name.is_empty() && address.is_empty() {
        return None;
    }

    let mut contact = Contact {
        name: name.first().map(|s| s.to_string()),
        ..Default::default()
    };
    contact.country = address.pop().map(str::to_string);
    contact.postal_code = address.pop().map(str::to_string);
    for line in address {
        contact.push_street(line);
    }
    Some(contact)
}

pub fn parse(raw: &str, psl: &SuffixList) -> Option<DomainRecord> {
    let text = raw.replace("\r\n", "\n");

    if text.contains("query quota") && text.contains("exceeded") {
        return None;
    }
    if text.contains("This domain name has not been registered") {
        return Some(DomainRecord::available(raw));
    }

    let domain = capture(&DOMAIN_NAME, &text)?;
    let mut record = DomainRecord::new(raw);

    match psl.split(domain) {
        Some((name, ext)) => {
            record.domain_name = Some(name);
            record.domain_name_ext = Some(ext);
        }
        None => record.domain_name = Some(domain.to_lowercase()),
    }

    if let Some(caps) = REGISTRAR.captures(&text) {
        if let Some(name) = caps.get(1).map(|m| m.as_str().trim()).filter(|s| !s.is_empty()) {
            match REGISTRAR_TAG.captures(name) {
                Some(tagged) => {
                    record.registrar_name = Some(tagged[1].to_string());
                    record.add_custom_field("registrarTag", &tagged[2]);
                }
                None => record.registrar_name = Some(name.to_string()),
            }
        }
        if let Some(url) = caps.get(2) {
            record.add_custom_field("registrarURL", url.as_str().trim());
        }
    }

    record.created_date = capture(&REGISTERED_ON, &text).and_then(|v| parse_date(v, DATE_FORMAT));
    record.expires_date = capture(&EXPIRY_DATE, &text).and_then(|v| parse_date(v, DATE_FORMAT));
    record.updated_date = capture(&LAST_UPDATED, &text).and_then(|v| parse_date(v, DATE_FORMAT));
    record.status = capture(&STATUS, &text).map(str::to_string);
    record.registrant = registrant(&text);

    if let Some(kind) = block(&text, "Registrant type:").first() {
        record.add_custom_field("registrantType", *kind);
    }

    let nameservers: Vec<Nameserver> = block(&text, "Name servers:")
        .into_iter()
        .filter(|line| !line.contains("No name servers listed"))
        .flat_map(Nameserver::classify_all)
        .collect();
    if !nameservers.is_empty() {
        record.nameservers = Some(nameservers);
    }

    Some(record)
}
