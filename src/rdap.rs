//! RDAP (Registration Data Access Protocol) Service
//!
//! Structured JSON successor to WHOIS (RFC 7480-7484). Base URLs come from
//! the IANA bootstrap registry, fetched lazily on first use.

use crate::{
    cache::TldCache,
    config::Config,
    errors::WhoisError,
    record::DomainRecord,
    registry::{ParserRegistry, RDAP_SERVER_ID},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

const RDAP_ACCEPT: &str = "application/rdap+json, application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url`; any status is a successful exchange, only transport
    /// failures are errors.
    async fn get(&self, url: &str, timeout_after: Duration) -> Result<HttpResponse, WhoisError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, WhoisError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout_after: Duration) -> Result<HttpResponse, WhoisError> {
        let response = self
            .client
            .get(url)
            .header("Accept", RDAP_ACCEPT)
            .timeout(timeout_after)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> WhoisError {
    if e.is_timeout() {
        WhoisError::Timeout
    } else {
        WhoisError::HttpError(e)
    }
}

/// `services` is a list of `[[tld, ...], [base_url, ...]]` pairs.
#[derive(Debug, Deserialize)]
struct RdapBootstrap {
    services: Vec<Vec<Vec<String>>>,
}

fn bootstrap_entries(bootstrap: RdapBootstrap) -> HashMap<String, String> {
    let mut entries = HashMap::new();

    for service in bootstrap.services {
        let (Some(tlds), Some(urls)) = (service.first(), service.get(1)) else { continue };
        let Some(base) = urls.iter().find(|u| u.starts_with("https://")).or_else(|| urls.first()) else {
            continue;
        };
        for tld in tlds {
            entries.entry(tld.to_lowercase()).or_insert_with(|| base.clone());
        }
    }
    entries
}

/// `<base>domain/<domain>`, tolerating a base without a trailing slash.
fn domain_url(base: &str, domain: &str) -> Result<Url, WhoisError> {
    let base = if base.ends_with('/') {
        Url::parse(base)?
    } else {
        Url::parse(&format!("{}/", base))?
    };
    Ok(base.join(&format!("domain/{}", domain))?)
}

pub struct RdapService {
    config: Arc<Config>,
    transport: Arc<dyn HttpTransport>,
    registry: Arc<ParserRegistry>,
    cache: Arc<TldCache>,
}

impl RdapService {
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn HttpTransport>,
        registry: Arc<ParserRegistry>,
        cache: Arc<TldCache>,
    ) -> Self {
        info!("RdapService initialized (bootstrap: {})", config.rdap_bootstrap_url);
        Self { config, transport, registry, cache }
    }

    /// Fetch the bootstrap registry and replace the cached base URLs.
    pub async fn refresh_bootstrap(&self, timeout_after: Duration) -> Result<usize, WhoisError> {
        let url = self.config.rdap_bootstrap_url.as_str();
        debug!("Fetching RDAP bootstrap data from {}", url);

        let response = self.transport.get(url, timeout_after).await?;
        if !(200..300).contains(&response.status) {
            return Err(WhoisError::RequestFailed { url: url.to_string(), status: response.status });
        }

        let bootstrap: RdapBootstrap = serde_json::from_str(&response.body)
            .map_err(|e| WhoisError::Internal(format!("Invalid RDAP bootstrap document: {}", e)))?;
        let count = self.cache.replace_rdap(bootstrap_entries(bootstrap)).await;

        info!("Successfully fetched RDAP bootstrap data: {} TLDs", count);
        Ok(count)
    }

    /// Base URL registered for exactly `tld`. A private suffix such as
    /// `uk.com` is never served by its parent registry.
    pub async fn find_rdap_server(&self, tld: &str, timeout_after: Duration) -> Result<Option<String>, WhoisError> {
        if self.cache.rdap_is_empty() {
            self.refresh_bootstrap(timeout_after).await?;
        }

        Ok(self.cache.rdap_base(tld).await)
    }

    /// `Ok(None)` when there is no RDAP service for the suffix or the server
    /// has nothing to say; errors for rate limiting and unexpected statuses.
    pub async fn lookup(&self, domain: &str, tld: &str, timeout_after: Duration) -> Result<Option<DomainRecord>, WhoisError> {
        let Some(base) = self.find_rdap_server(tld, timeout_after).await? else {
            debug!("No RDAP service for {}", tld);
            return Ok(None);
        };

        let url = domain_url(&base, domain)?;
        debug!("Querying RDAP server: {}", url);

        let response = self.transport.get(url.as_str(), timeout_after).await?;
        debug!("RDAP response status {}, length: {} bytes", response.status, response.body.len());

        match response.status {
            200..=299 | 404 => Ok(self.registry.dispatch(RDAP_SERVER_ID, &response.body)),
            400 => Ok(None),
            429 => {
                warn!("RDAP server {} rate limited lookup of {}", base, domain);
                Err(WhoisError::RateLimited(domain.to_string()))
            }
            status => Err(WhoisError::RequestFailed { url: url.to_string(), status }),
        }
    }
}
