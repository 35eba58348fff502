use anyhow::Context;
use axum::http::StatusCode;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redirect_server: ServerConfig,
    pub cache: CacheConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Status code used for redirect outcomes (302, 303 or 307)
    pub redirect_status: u16,
}

impl ServerConfig {
    pub fn redirect_status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.redirect_status).unwrap_or(StatusCode::FOUND)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 0 disables the read cache
    pub max_entries: u64,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    None,
    Standard,
    Cloudflare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Geo lookup endpoint; `{ip}` is replaced by the client address
    pub geo_lookup_url: String,
    /// Optional MaxMind City database used instead of the HTTP lookup
    pub geoip_city_db: Option<String>,
    pub trusted_proxy_mode: TrustedProxyMode,
    pub trusted_proxies: Vec<IpNet>,
    pub num_trusted_proxies: Option<usize>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            geo_lookup_url: AnalyticsConfig::DEFAULT_GEO_LOOKUP_URL.to_string(),
            geoip_city_db: None,
            trusted_proxy_mode: TrustedProxyMode::None,
            trusted_proxies: Vec::new(),
            num_trusted_proxies: None,
        }
    }
}

impl AnalyticsConfig {
    pub const DEFAULT_GEO_LOOKUP_URL: &'static str = "https://ipapi.co/{ip}/json/";
}

const ALLOWED_REDIRECT_STATUSES: [u16; 3] = [302, 303, 307];

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./scanroute.db?mode=rwc".to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let redirect_host =
            std::env::var("REDIRECT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let redirect_port = std::env::var("REDIRECT_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("REDIRECT_PORT must be a valid port number")?;

        let requested_status = std::env::var("REDIRECT_STATUS")
            .unwrap_or_else(|_| "302".to_string())
            .parse::<u16>()
            .context("REDIRECT_STATUS must be an HTTP status code")?;
        let redirect_status = if ALLOWED_REDIRECT_STATUSES.contains(&requested_status) {
            requested_status
        } else {
            tracing::warn!(
                "REDIRECT_STATUS {requested_status} is not a temporary redirect, falling back to 302. Supported values: 302, 303, 307"
            );
            302
        };

        let cache_max_entries = std::env::var("CACHE_MAX_ENTRIES")
            .unwrap_or_else(|_| "10000".to_string())
            .parse::<u64>()
            .context("CACHE_MAX_ENTRIES must be a non-negative integer")?;
        let cache_ttl_secs = std::env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()
            .context("CACHE_TTL_SECS must be a non-negative integer")?;

        let analytics = Self::analytics_from_env()?;

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            redirect_server: ServerConfig {
                host: redirect_host,
                port: redirect_port,
                redirect_status,
            },
            cache: CacheConfig {
                max_entries: cache_max_entries,
                ttl_secs: cache_ttl_secs,
            },
            analytics,
        })
    }

    fn analytics_from_env() -> anyhow::Result<AnalyticsConfig> {
        let enabled = std::env::var("SCAN_LOGGING_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(true);

        let geo_lookup_url = std::env::var("GEO_LOOKUP_URL")
            .unwrap_or_else(|_| AnalyticsConfig::DEFAULT_GEO_LOOKUP_URL.to_string());

        let geoip_city_db = std::env::var("GEOIP_CITY_DB")
            .ok()
            .filter(|p| !p.trim().is_empty());

        let trusted_proxy_mode = match std::env::var("TRUSTED_PROXY_MODE")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase()
            .as_str()
        {
            "none" => TrustedProxyMode::None,
            "standard" => TrustedProxyMode::Standard,
            "cloudflare" => TrustedProxyMode::Cloudflare,
            other => {
                tracing::warn!(
                    "Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'none'. Supported values: none, standard, cloudflare"
                );
                TrustedProxyMode::None
            }
        };

        let trusted_proxies = parse_trusted_proxies(
            &std::env::var("TRUSTED_PROXIES").unwrap_or_default(),
        )?;

        let num_trusted_proxies = std::env::var("NUM_TRUSTED_PROXIES")
            .ok()
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("NUM_TRUSTED_PROXIES must be a non-negative integer")?;

        Ok(AnalyticsConfig {
            enabled,
            geo_lookup_url,
            geoip_city_db,
            trusted_proxy_mode,
            trusted_proxies,
            num_trusted_proxies,
        })
    }
}

/// Parse a comma-separated CIDR list; bare addresses become host networks.
pub fn parse_trusted_proxies(raw: &str) -> anyhow::Result<Vec<IpNet>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<IpNet>()
                .or_else(|_| entry.parse::<std::net::IpAddr>().map(IpNet::from))
                .with_context(|| format!("invalid TRUSTED_PROXIES entry '{entry}'"))
        })
        .collect()
}
