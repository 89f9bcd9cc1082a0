//! # Whois Resolver Library
//!
//! Domain registration lookup over RDAP and WHOIS for Rust.
//!
//! ## Features
//!
//! - RDAP first, with base URLs discovered from the IANA bootstrap registry
//! - WHOIS fallback with server discovery via `whois.iana.org`
//! - Referral following across registry and registrar servers
//! - Per-server parsers producing one normalised [`DomainRecord`]
//! - Public-suffix aware TLD extraction and IDNA normalisation
//! - Pluggable transports and parser registries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_resolver::WhoisClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhoisClient::new().await?;
//!     if let Some(record) = client.lookup("example.com").await? {
//!         println!("Registrar: {:?}", record.registrar_name);
//!         println!("Expires: {:?}", record.expires_date);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod parsers;
pub mod patches;
pub mod rdap;
pub mod record;
pub mod registry;
pub mod whois;

// Re-export main types for easy access
pub use cache::TldCache;
pub use config::Config;
pub use domain::{normalize_domain, SuffixList};
pub use errors::WhoisError;
pub use rdap::{HttpResponse, HttpTransport, RdapService, ReqwestTransport};
pub use record::{Contact, DomainRecord, FieldValue, Nameserver, NameserverKind};
pub use registry::{ParserRegistry, RDAP_SERVER_ID};
pub use whois::{TcpTransport, WhoisService, WhoisTransport};

use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Per-call knobs. Defaults come from [`Config`].
#[derive(Debug, Clone)]
pub struct LookupOptions {
    /// Skip discovery and start traversal at this WHOIS server.
    pub host: Option<String>,
    /// Applied to every network operation individually.
    pub timeout: Duration,
    /// Number of WHOIS servers queried after discovery; 0 queries none.
    pub max_referral_depth: usize,
    pub use_rdap: bool,
}

impl LookupOptions {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_referral_depth(mut self, depth: usize) -> Self {
        self.max_referral_depth = depth;
        self
    }

    pub fn with_rdap(mut self, use_rdap: bool) -> Self {
        self.use_rdap = use_rdap;
        self
    }
}

impl From<&Config> for LookupOptions {
    fn from(config: &Config) -> Self {
        Self {
            host: None,
            timeout: Duration::from_millis(config.whois_timeout_ms),
            max_referral_depth: config.max_referrals,
            use_rdap: config.use_rdap,
        }
    }
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// High-level lookup client. Cloning is cheap and clones share caches.
#[derive(Clone)]
pub struct WhoisClient {
    config: Arc<Config>,
    suffix_list: Arc<SuffixList>,
    registry: Arc<ParserRegistry>,
    cache: Arc<TldCache>,
    whois: Arc<WhoisService>,
    rdap: Arc<RdapService>,
}

impl WhoisClient {
    /// Create a new client from `.env` and environment configuration
    pub async fn new() -> Result<Self, WhoisError> {
        let config = Arc::new(Config::load()?);
        Self::new_with_config(config).await
    }

    /// Create a new client with custom configuration
    pub async fn new_with_config(config: Arc<Config>) -> Result<Self, WhoisError> {
        Self::builder(config).build().await
    }

    pub fn builder(config: Arc<Config>) -> WhoisClientBuilder {
        WhoisClientBuilder {
            config,
            suffix_list: None,
            registry: None,
            whois_transport: None,
            http_transport: None,
        }
    }

    /// Look up `domain` with options taken from the client configuration.
    pub async fn lookup(&self, domain: &str) -> Result<Option<DomainRecord>, WhoisError> {
        self.lookup_with_options(domain, &LookupOptions::from(self.config.as_ref())).await
    }

    /// RDAP first, then WHOIS discovery and referral traversal.
    ///
    /// `Ok(None)` means no server produced parseable data. A confirmed
    /// unregistered domain is a record with `domain_availability == Some(true)`.
    pub async fn lookup_with_options(
        &self,
        domain: &str,
        options: &LookupOptions,
    ) -> Result<Option<DomainRecord>, WhoisError> {
        let domain = normalize_domain(domain)?;
        let tld = self.suffix_list.tld(&domain)?;
        debug!("Looking up {} (suffix {})", domain, tld);

        if options.use_rdap {
            match self.rdap.lookup(&domain, &tld, options.timeout).await {
                Ok(Some(record)) => {
                    info!("RDAP lookup succeeded for {}", domain);
                    return Ok(Some(record));
                }
                Ok(None) => debug!("No RDAP data for {}, falling back to WHOIS", domain),
                Err(e) if self.config.strict_rdap => return Err(e),
                Err(e) => warn!("RDAP lookup failed for {}: {}, falling back to WHOIS", domain, e),
            }
        }

        let host = self
            .whois
            .find_whois_server(&domain, &tld, options.host.as_deref(), options.timeout)
            .await?;

        self.whois
            .follow_referrals(&host, &domain, options.max_referral_depth, options.timeout)
            .await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tld_cache(&self) -> &TldCache {
        &self.cache
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn suffix_list(&self) -> &SuffixList {
        &self.suffix_list
    }
}

/// Assembles a [`WhoisClient`], substituting defaults for anything not set.
pub struct WhoisClientBuilder {
    config: Arc<Config>,
    suffix_list: Option<Arc<SuffixList>>,
    registry: Option<ParserRegistry>,
    whois_transport: Option<Arc<dyn WhoisTransport>>,
    http_transport: Option<Arc<dyn HttpTransport>>,
}

impl WhoisClientBuilder {
    pub fn suffix_list(mut self, suffix_list: Arc<SuffixList>) -> Self {
        self.suffix_list = Some(suffix_list);
        self
    }

    /// Replaces the built-in parsers entirely.
    pub fn registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn whois_transport(mut self, transport: Arc<dyn WhoisTransport>) -> Self {
        self.whois_transport = Some(transport);
        self
    }

    pub fn http_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.http_transport = Some(transport);
        self
    }

    pub async fn build(self) -> Result<WhoisClient, WhoisError> {
        let config = self.config;

        let suffix_list = match (self.suffix_list, &config.public_suffix_list) {
            (Some(list), _) => list,
            (None, Some(path)) => {
                info!("Loading public suffix list from {}", path.display());
                Arc::new(SuffixList::from_path(path)?)
            }
            (None, None) => Arc::new(SuffixList::embedded()),
        };

        let registry = Arc::new(
            self.registry
                .unwrap_or_else(|| ParserRegistry::with_defaults(suffix_list.clone())),
        );

        let cache = Arc::new(if config.seed_whois_patches {
            TldCache::seeded(patches::WHOIS_PATCHES.iter().map(|(tld, server)| (*tld, *server))).await
        } else {
            TldCache::new()
        });

        let whois_transport = match self.whois_transport {
            Some(transport) => transport,
            None => Arc::new(TcpTransport::new(config.max_response_size)),
        };
        let http_transport = match self.http_transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config.user_agent)?),
        };

        let whois = Arc::new(WhoisService::new(
            config.clone(),
            whois_transport,
            registry.clone(),
            cache.clone(),
        ));
        let rdap = Arc::new(RdapService::new(config.clone(), http_transport, registry.clone(), cache.clone()));

        info!("WhoisClient initialized with {:?}", registry);

        Ok(WhoisClient { config, suffix_list, registry, cache, whois, rdap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_options_from_config() {
        let config = Config { whois_timeout_ms: 2_500, max_referrals: 3, use_rdap: false, ..Config::default() };
        let options = LookupOptions::from(&config);
        assert_eq!(options.timeout, Duration::from_millis(2_500));
        assert_eq!(options.max_referral_depth, 3);
        assert!(!options.use_rdap);
        assert!(options.host.is_none());
    }

    #[test]
    fn test_lookup_options_defaults() {
        let options = LookupOptions::default();
        assert_eq!(options.timeout, Duration::from_millis(15_000));
        assert_eq!(options.max_referral_depth, 1);
        assert!(options.use_rdap);

        let options = options.with_host("whois.example").with_max_referral_depth(0);
        assert_eq!(options.host.as_deref(), Some("whois.example"));
        assert_eq!(options.max_referral_depth, 0);
    }

    #[tokio::test]
    async fn test_client_creation_seeds_patches() {
        let client = WhoisClient::new_with_config(Arc::new(Config::default())).await.unwrap();
        assert_eq!(
            client.tld_cache().whois_server("uk.com").await.as_deref(),
            Some("whois.centralnic.com")
        );
        assert!(client.registry().contains(RDAP_SERVER_ID));
    }

    #[tokio::test]
    async fn test_domain_validation() {
        let client = WhoisClient::new_with_config(Arc::new(Config::default())).await.unwrap();

        let result = client.lookup("").await;
        assert!(matches!(result, Err(WhoisError::InvalidDomain(_))));

        let result = client.lookup("invalid").await;
        assert!(matches!(result, Err(WhoisError::InvalidDomain(_))));
    }
}
