use crate::{
    cache::TldCache, config::Config, errors::WhoisError, record::DomainRecord, registry::ParserRegistry,
};
use async_trait::async_trait;
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::{debug, info, warn};

const READ_BUFFER_SIZE: usize = 8192;

/// One WHOIS exchange: send `query`, return everything the server wrote
/// before closing, with `\r\n` normalised to `\n`.
#[async_trait]
pub trait WhoisTransport: Send + Sync {
    async fn query(&self, host: &str, port: u16, query: &str, timeout_after: Duration) -> Result<String, WhoisError>;
}

/// Plain TCP transport (RFC 3912).
#[derive(Debug, Clone)]
pub struct TcpTransport {
    max_response_size: usize,
}

impl TcpTransport {
    pub fn new(max_response_size: usize) -> Self {
        Self { max_response_size }
    }

    async fn exchange(&self, host: &str, port: u16, query: &str) -> Result<String, WhoisError> {
        let mut stream = TcpStream::connect((host, port)).await?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        let query_line = format!("{}\r\n", query);
        stream.write_all(query_line.as_bytes()).await?;

        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let mut response = Vec::new();

        loop {
            match stream.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => {
                    response.extend_from_slice(&buffer[..n]);
                    if response.len() > self.max_response_size {
                        return Err(WhoisError::ResponseTooLarge);
                    }
                }
                Err(e) => return Err(WhoisError::IoError(e)),
            }
        }

        Ok(String::from_utf8_lossy(&response).replace("\r\n", "\n"))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_RESPONSE_SIZE)
    }
}

#[async_trait]
impl WhoisTransport for TcpTransport {
    async fn query(&self, host: &str, port: u16, query: &str, timeout_after: Duration) -> Result<String, WhoisError> {
        // Dropping the exchange future on expiry closes the socket.
        timeout(timeout_after, self.exchange(host, port, query)).await?
    }
}

/// WHOIS half of a lookup: server discovery and referral traversal.
pub struct WhoisService {
    config: Arc<Config>,
    transport: Arc<dyn WhoisTransport>,
    registry: Arc<ParserRegistry>,
    cache: Arc<TldCache>,
}

impl WhoisService {
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn WhoisTransport>,
        registry: Arc<ParserRegistry>,
        cache: Arc<TldCache>,
    ) -> Self {
        info!("WhoisService initialized (root server: {})", config.root_server);
        Self { config, transport, registry, cache }
    }

    /// Host to start traversal at: explicit override, cached server for the
    /// suffix, or whatever the root server refers to.
    pub async fn find_whois_server(
        &self,
        domain: &str,
        tld: &str,
        host: Option<&str>,
        timeout_after: Duration,
    ) -> Result<String, WhoisError> {
        if let Some(host) = host {
            debug!("Using caller-supplied whois server {} for {}", host, domain);
            return Ok(host.trim().to_lowercase());
        }

        if let Some(server) = self.cache.whois_server(tld).await {
            return Ok(server);
        }

        self.discover_whois_server(domain, tld, timeout_after).await
    }

    async fn discover_whois_server(&self, domain: &str, tld: &str, timeout_after: Duration) -> Result<String, WhoisError> {
        let root = self.config.root_server.as_str();
        debug!("Querying root server {} for TLD: {}", root, tld);

        let raw = self.raw_whois_query(root, domain, timeout_after).await?;
        let record = self
            .registry
            .dispatch(root, &raw)
            .ok_or_else(|| WhoisError::NoRecord(domain.to_string()))?;
        let server = record
            .whois_server
            .ok_or_else(|| WhoisError::UnsupportedTld(domain.to_string()))?;

        self.cache.insert_whois(tld, &server).await;
        info!("Discovered whois server via root query for {}: {}", tld, server);
        Ok(server)
    }

    pub async fn raw_whois_query(&self, server: &str, domain: &str, timeout_after: Duration) -> Result<String, WhoisError> {
        let query = self.registry.format_query(server, domain);
        let response = self
            .transport
            .query(server, self.config.whois_port, &query, timeout_after)
            .await?;
        debug!("Whois server {} response length: {} bytes", server, response.len());
        Ok(response)
    }

    /// Query up to `depth` servers starting at `initial_server`, merging each
    /// parsed hop over the previous ones. A referral back to a server already
    /// visited ends the chain.
    pub async fn follow_referrals(
        &self,
        initial_server: &str,
        domain: &str,
        depth: usize,
        timeout_after: Duration,
    ) -> Result<Option<DomainRecord>, WhoisError> {
        let mut result: Option<DomainRecord> = None;
        let mut visited = HashSet::new();
        let mut next = Some(initial_server.to_string());

        for _ in 0..depth {
            let Some(current) = next.take() else { break };
            visited.insert(current.clone());

            let raw = self.raw_whois_query(&current, domain, timeout_after).await?;
            let record = self.registry.dispatch(&current, &raw);

            next = record.as_ref().and_then(|r| r.whois_server.clone()).filter(|referral| {
                if visited.contains(referral) {
                    debug!("Ignoring referral from {} back to {}", current, referral);
                    false
                } else {
                    true
                }
            });
            if let Some(referral) = &next {
                debug!("Following referral from {} to {}", current, referral);
            }

            match record {
                Some(record) => {
                    result = Some(match result.take() {
                        Some(mut acc) => {
                            acc.merge(record);
                            acc
                        }
                        None => record,
                    });
                }
                None => warn!("No data parsed from {} for {}", current, domain),
            }
        }

        Ok(result)
    }
}
