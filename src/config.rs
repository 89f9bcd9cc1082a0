use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MAX_REFERRALS: usize = 1;
pub const DEFAULT_WHOIS_PORT: u16 = 43;
pub const DEFAULT_ROOT_SERVER: &str = "whois.iana.org";
pub const DEFAULT_RDAP_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = concat!("whois-resolver/", env!("CARGO_PKG_VERSION"));

/// Environment variable to config key. Timeouts are always milliseconds.
const ENV_MAPPINGS: [(&str, &str); 11] = [
    ("WHOIS_TIMEOUT_MS", "whois_timeout_ms"),
    ("WHOIS_PORT", "whois_port"),
    ("MAX_REFERRALS", "max_referrals"),
    ("USE_RDAP", "use_rdap"),
    ("STRICT_RDAP", "strict_rdap"),
    ("ROOT_WHOIS_SERVER", "root_server"),
    ("RDAP_BOOTSTRAP_URL", "rdap_bootstrap_url"),
    ("MAX_RESPONSE_SIZE", "max_response_size"),
    ("SEED_WHOIS_PATCHES", "seed_whois_patches"),
    ("PUBLIC_SUFFIX_LIST", "public_suffix_list"),
    ("USER_AGENT", "user_agent"),
];

#[derive(Debug, Clone)]
pub struct Config {
    pub whois_timeout_ms: u64,
    pub whois_port: u16,
    pub max_referrals: usize,
    pub use_rdap: bool,
    /// Propagate RDAP failures instead of falling back to WHOIS.
    pub strict_rdap: bool,
    pub root_server: String,
    pub rdap_bootstrap_url: String,
    pub max_response_size: usize,
    pub seed_whois_patches: bool,
    /// Suffix list file to use instead of the embedded copy.
    pub public_suffix_list: Option<PathBuf>,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    pub whois_timeout_ms: u64,
    pub whois_port: u16,
    pub max_referrals: usize,
    pub use_rdap: bool,
    pub strict_rdap: bool,
    pub root_server: String,
    pub rdap_bootstrap_url: String,
    pub max_response_size: usize,
    pub seed_whois_patches: bool,
    #[serde(default)]
    pub public_suffix_list: Option<String>,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whois_timeout_ms: DEFAULT_TIMEOUT_MS,
            whois_port: DEFAULT_WHOIS_PORT,
            max_referrals: DEFAULT_MAX_REFERRALS,
            use_rdap: true,
            strict_rdap: false,
            root_server: DEFAULT_ROOT_SERVER.to_string(),
            rdap_bootstrap_url: DEFAULT_RDAP_BOOTSTRAP_URL.to_string(),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            seed_whois_patches: true,
            public_suffix_list: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `.env`, then process environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let defaults = Config::default();
        let mut settings = config::Config::builder()
            .set_default("whois_timeout_ms", defaults.whois_timeout_ms)?
            .set_default("whois_port", defaults.whois_port as i64)?
            .set_default("max_referrals", defaults.max_referrals as i64)?
            .set_default("use_rdap", defaults.use_rdap)?
            .set_default("strict_rdap", defaults.strict_rdap)?
            .set_default("root_server", defaults.root_server)?
            .set_default("rdap_bootstrap_url", defaults.rdap_bootstrap_url)?
            .set_default("max_response_size", defaults.max_response_size as i64)?
            .set_default("seed_whois_patches", defaults.seed_whois_patches)?
            .set_default("user_agent", defaults.user_agent)?;

        settings = Self::apply_env_overrides(settings)?;

        let data: ConfigData = settings.build()?.try_deserialize()?;

        Ok(Config {
            whois_timeout_ms: data.whois_timeout_ms,
            whois_port: data.whois_port,
            max_referrals: data.max_referrals,
            use_rdap: data.use_rdap,
            strict_rdap: data.strict_rdap,
            root_server: data.root_server.trim().to_lowercase(),
            rdap_bootstrap_url: data.rdap_bootstrap_url,
            max_response_size: data.max_response_size,
            seed_whois_patches: data.seed_whois_patches,
            public_suffix_list: data
                .public_suffix_list
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            user_agent: data.user_agent,
        })
    }

    fn apply_env_overrides(
        mut settings: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        for (env_var, config_key) in ENV_MAPPINGS {
            if let Ok(value) = std::env::var(env_var) {
                settings = settings.set_override(config_key, value)?;
            }
        }

        Ok(settings)
    }
}
