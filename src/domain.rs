//! Domain name normalisation and public-suffix splitting.

use crate::errors::WhoisError;
use publicsuffix::{List, Psl};
use std::path::Path;
use tracing::warn;

static EMBEDDED_RULES: &str = include_str!("../data/public_suffix_list.dat");

/// Public suffix rules used for TLD extraction and for splitting parsed
/// domain names. Pure: loading happens once, lookups never touch the network.
pub struct SuffixList {
    list: List,
}

impl SuffixList {
    /// Upstream list compiled into the crate, ICANN and private sections.
    pub fn embedded() -> Self {
        match Self::from_rules(EMBEDDED_RULES) {
            Ok(list) => list,
            Err(e) => {
                warn!("Embedded public suffix list failed to parse ({}), using wildcard rule only", e);
                Self { list: List::new() }
            }
        }
    }

    pub fn from_rules(rules: &str) -> Result<Self, WhoisError> {
        let list = rules
            .parse::<List>()
            .map_err(|e| WhoisError::SuffixList(e.to_string()))?;
        Ok(Self { list })
    }

    pub fn from_path(path: &Path) -> Result<Self, WhoisError> {
        let rules = std::fs::read_to_string(path)?;
        Self::from_rules(&rules)
    }

    /// Registrable suffix of `domain` ("co.uk" for "example.co.uk"), falling
    /// back to the last label when the list cannot place the name.
    pub fn tld(&self, domain: &str) -> Result<String, WhoisError> {
        let domain = domain.trim_end_matches('.').to_lowercase();
        match self.list.domain(domain.as_bytes()) {
            Some(parsed) => match std::str::from_utf8(parsed.suffix().as_bytes()) {
                Ok(tld) => Ok(tld.to_string()),
                Err(_) => Err(WhoisError::InvalidDomain(format!("Invalid UTF-8 in TLD for domain: {}", domain))),
            },
            None => {
                warn!("Public suffix parsing failed for {}, using fallback", domain);
                naive_tld(&domain)
                    .map(str::to_string)
                    .ok_or_else(|| WhoisError::InvalidDomain(format!("No TLD found in domain: {}", domain)))
            }
        }
    }

    /// Split a registered name into its label and suffix:
    /// "EXAMPLE.COM" becomes ("example", "com").
    pub fn split(&self, name: &str) -> Option<(String, String)> {
        let name = name.trim().trim_end_matches('.').to_lowercase();
        let parsed = self.list.domain(name.as_bytes())?;
        let registrable = std::str::from_utf8(parsed.as_bytes()).ok()?;
        let suffix = std::str::from_utf8(parsed.suffix().as_bytes()).ok()?;
        let label = registrable.strip_suffix(suffix)?.strip_suffix('.')?;
        Some((label.to_string(), suffix.to_string()))
    }
}

impl Default for SuffixList {
    fn default() -> Self {
        Self::embedded()
    }
}

fn naive_tld(domain: &str) -> Option<&str> {
    domain.rsplit('.').next().filter(|label| !label.is_empty())
}

/// Trim, drop a trailing root dot and convert to the ASCII-compatible form.
pub fn normalize_domain(domain: &str) -> Result<String, WhoisError> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(WhoisError::InvalidDomain("Empty domain".to_string()));
    }

    let ascii = idna::domain_to_ascii(trimmed)
        .map_err(|_| WhoisError::InvalidDomain(format!("Invalid domain name: {}", trimmed)))?;

    if !ascii.contains('.') {
        return Err(WhoisError::InvalidDomain("Invalid domain format".to_string()));
    }
    if ascii.len() > 253 {
        return Err(WhoisError::InvalidDomain(format!(
            "Domain name exceeds maximum length of 253 characters (got {})",
            ascii.len()
        )));
    }

    Ok(ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tld_uses_multi_label_suffix() {
        let psl = SuffixList::embedded();
        assert_eq!(psl.tld("example.com").unwrap(), "com");
        assert_eq!(psl.tld("www.example.co.uk").unwrap(), "co.uk");
        assert_eq!(psl.tld("blackhouse.uk.com").unwrap(), "uk.com");
    }

    #[test]
    fn test_tld_falls_back_to_last_label() {
        let psl = SuffixList::embedded();
        assert_eq!(psl.tld("com").unwrap(), "com");
    }

    #[test]
    fn test_split_registered_name() {
        let psl = SuffixList::embedded();
        assert_eq!(psl.split("EXAMPLE.COM"), Some(("example".into(), "com".into())));
        assert_eq!(psl.split("bbc.co.uk"), Some(("bbc".into(), "co.uk".into())));
        assert_eq!(psl.split("com"), None);
    }

    #[test]
    fn test_country_second_level_suffixes() {
        let psl = SuffixList::embedded();
        assert_eq!(psl.tld("example.com.sg").unwrap(), "com.sg");
        assert_eq!(psl.tld("www.example.co.il").unwrap(), "co.il");
        assert_eq!(psl.tld("example.com.au").unwrap(), "com.au");
        assert_eq!(psl.split("EXAMPLE.COM.SG"), Some(("example".into(), "com.sg".into())));
        assert_eq!(psl.split("example.co.il"), Some(("example".into(), "co.il".into())));
    }

    #[test]
    fn test_private_section_suffixes() {
        let psl = SuffixList::embedded();
        assert_eq!(psl.tld("project.github.io").unwrap(), "github.io");
        assert_eq!(psl.tld("example.eu.org").unwrap(), "eu.org");
    }

    #[test]
    fn test_normalize_domain_to_punycode() {
        assert_eq!(normalize_domain("Bücher.example").unwrap(), "xn--bcher-kva.example");
        assert_eq!(normalize_domain(" EXAMPLE.COM. ").unwrap(), "example.com");
    }

    #[test]
    fn test_normalize_domain_rejects_bad_input() {
        assert!(matches!(normalize_domain(""), Err(WhoisError::InvalidDomain(_))));
        assert!(matches!(normalize_domain("invalid"), Err(WhoisError::InvalidDomain(_))));
    }
}
