use once_cell::sync::Lazy;
use std::collections::HashMap;

// Suffixes whose registry is missing from, or not referred to by, the IANA
// root database. Generated out of band from the rfc1036/whois tld_serv_list.
pub static WHOIS_PATCHES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // CentralNic second-level namespaces
    for suffix in [
        "br.com", "cn.com", "de.com", "eu.com", "gb.net", "hu.net", "jp.net", "jpn.com",
        "mex.com", "ru.com", "sa.com", "se.net", "uk.com", "uk.net", "us.com", "za.com",
    ] {
        map.insert(suffix, "whois.centralnic.com");
    }

    // Registries IANA lists without a port 43 service
    map.insert("es", "whois.nic.es");

    // Delegated second-level zones with their own servers
    map.insert("ac.uk", "whois.ja.net");
    map.insert("gov.uk", "whois.ja.net");
    map.insert("priv.at", "whois.nic.priv.at");
    map.insert("eu.org", "whois.eu.org");

    map
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_keys_are_bare_suffixes() {
        assert!(WHOIS_PATCHES.keys().all(|k| !k.starts_with('.') && *k == k.to_lowercase()));
        assert_eq!(WHOIS_PATCHES.get("uk.com"), Some(&"whois.centralnic.com"));
    }
}
