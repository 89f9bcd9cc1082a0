//! Server identifier → response parser dispatch.

use crate::domain::SuffixList;
use crate::parsers;
use crate::record::DomainRecord;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Identifier the RDAP parser is registered under.
pub const RDAP_SERVER_ID: &str = "rdap";

pub type ParseFn = Arc<dyn Fn(&str) -> Option<DomainRecord> + Send + Sync>;
pub type QueryFormatter = fn(&str) -> String;

/// Parsers keyed by the exact identifier of the server that answered.
///
/// Built once and shared with the client, so registries with different
/// parser sets can live side by side in one process.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, ParseFn>,
    query_formats: HashMap<String, QueryFormatter>,
}

impl ParserRegistry {
    /// Empty registry: every dispatch yields `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in dialects.
    pub fn with_defaults(psl: Arc<SuffixList>) -> Self {
        let mut registry = Self::new();

        registry.register("whois.iana.org", parsers::iana::parse);

        let uk = psl.clone();
        registry.register("whois.nic.uk", move |raw: &str| parsers::nominet::parse(raw, &uk));

        let verisign = Arc::new(parsers::icann::IcannParser::verisign(psl.clone()));
        registry.register("whois.verisign-grs.com", move |raw: &str| verisign.parse(raw));

        let pir = Arc::new(parsers::icann::IcannParser::pir(psl.clone()));
        for host in ["whois.publicinterestregistry.org", "whois.pir.org"] {
            let pir = pir.clone();
            registry.register(host, move |raw: &str| pir.parse(raw));
        }

        let centralnic = Arc::new(parsers::icann::IcannParser::centralnic(psl.clone()));
        registry.register("whois.centralnic.com", move |raw: &str| centralnic.parse(raw));

        registry.register(RDAP_SERVER_ID, move |raw: &str| parsers::rdap::parse(raw, &psl));

        registry.register_query_format("whois.verisign-grs.com", |domain| format!("domain {}", domain));
        registry.register_query_format("whois.denic.de", |domain| format!("-T dn,ace {}", domain));
        registry.register_query_format("whois.jprs.jp", |domain| format!("{}/e", domain));

        registry
    }

    /// Associate `parser` with `server`, replacing any earlier registration.
    pub fn register<F>(&mut self, server: impl Into<String>, parser: F)
    where
        F: Fn(&str) -> Option<DomainRecord> + Send + Sync + 'static,
    {
        self.parsers.insert(server.into(), Arc::new(parser));
    }

    pub fn register_query_format(&mut self, server: impl Into<String>, formatter: QueryFormatter) {
        self.query_formats.insert(server.into(), formatter);
    }

    pub fn contains(&self, server: &str) -> bool {
        self.parsers.contains_key(server)
    }

    /// Parse `raw` with the parser registered for `server`. An unknown server
    /// is not an error: the response simply contributes no data.
    pub fn dispatch(&self, server: &str, raw: &str) -> Option<DomainRecord> {
        match self.parsers.get(server) {
            Some(parser) => parser(raw),
            None => {
                debug!("No parser registered for {}", server);
                None
            }
        }
    }

    /// Query line body to send to `server` for `domain`.
    pub fn format_query(&self, server: &str, domain: &str) -> String {
        match self.query_formats.get(server) {
            Some(format) => format(domain),
            None => domain.to_string(),
        }
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut servers: Vec<_> = self.parsers.keys().collect();
        servers.sort();
        f.debug_struct("ParserRegistry").field("servers", &servers).finish()
    }
}
