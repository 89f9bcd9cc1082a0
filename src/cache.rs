use moka::future::Cache;
use std::collections::HashMap;
use tracing::debug;

/// Suffix → server mappings shared by every lookup on one client.
///
/// Neither map expires. The WHOIS map only grows; the RDAP map starts empty
/// and is rebuilt from the bootstrap registry whenever it is found empty.
pub struct TldCache {
    whois: Cache<String, String>,
    rdap: Cache<String, String>,
}

impl TldCache {
    pub fn new() -> Self {
        Self {
            whois: Cache::builder().build(),
            rdap: Cache::builder().build(),
        }
    }

    /// Cache pre-seeded with static WHOIS servers.
    pub async fn seeded<'a, I>(patches: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let cache = Self::new();
        let mut count = 0usize;
        for (tld, server) in patches {
            cache.insert_whois(tld, server).await;
            count += 1;
        }
        debug!("Seeded WHOIS cache with {} static entries", count);
        cache
    }

    pub async fn whois_server(&self, tld: &str) -> Option<String> {
        let key = normalize_key(tld);
        let hit = self.whois.get(&key).await;
        match &hit {
            Some(server) => debug!("WHOIS cache hit for {}: {}", key, server),
            None => debug!("WHOIS cache miss for {}", key),
        }
        hit
    }

    pub async fn insert_whois(&self, tld: &str, server: &str) {
        self.whois.insert(normalize_key(tld), server.trim().to_lowercase()).await;
    }

    pub async fn rdap_base(&self, tld: &str) -> Option<String> {
        self.rdap.get(&normalize_key(tld)).await
    }

    pub fn rdap_is_empty(&self) -> bool {
        self.rdap.iter().next().is_none()
    }

    /// Load a freshly parsed bootstrap mapping, returning the entry count.
    /// Existing keys are overwritten; concurrent refreshes are last-writer-wins.
    pub async fn replace_rdap(&self, entries: HashMap<String, String>) -> usize {
        let count = entries.len();
        for (tld, base) in entries {
            self.rdap.insert(normalize_key(&tld), base).await;
        }
        debug!("RDAP cache rebuilt with {} entries", count);
        count
    }
}

impl Default for TldCache {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_key(tld: &str) -> String {
    tld.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_whois_lookup_normalizes_keys() {
        let cache = TldCache::seeded([("com", "whois.verisign-grs.com")]).await;
        assert_eq!(cache.whois_server(".COM").await.as_deref(), Some("whois.verisign-grs.com"));
        assert!(cache.whois_server("net").await.is_none());
    }

    #[tokio::test]
    async fn test_insert_whois_overwrites() {
        let cache = TldCache::new();
        cache.insert_whois("org", "whois.pir.org").await;
        cache.insert_whois("org", "WHOIS.PUBLICINTERESTREGISTRY.ORG").await;
        assert_eq!(
            cache.whois_server("org").await.as_deref(),
            Some("whois.publicinterestregistry.org")
        );
    }

    #[tokio::test]
    async fn test_rdap_starts_empty_until_replaced() {
        let cache = TldCache::new();
        assert!(cache.rdap_is_empty());

        let mut entries = HashMap::new();
        entries.insert("com".to_string(), "https://rdap.verisign.com/com/v1/".to_string());
        assert_eq!(cache.replace_rdap(entries).await, 1);

        assert!(!cache.rdap_is_empty());
        assert_eq!(
            cache.rdap_base("com").await.as_deref(),
            Some("https://rdap.verisign.com/com/v1/")
        );
    }
}
