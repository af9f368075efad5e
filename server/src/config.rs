use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use ladle_core::OwnerId;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "ladle.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Server settings read at startup.
#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub pool_size: u32,
    /// Bearer tokens and the owner each one authenticates as.
    pub api_tokens: Vec<(OwnerId, String)>,
    /// Hosts recipes may be imported from. Empty means any host.
    pub allowed_hosts: Vec<String>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owners: Vec<OwnerId> = self.api_tokens.iter().map(|(owner, _)| *owner).collect();
        f.debug_struct("ServerConfig")
            .field("database_url", &self.database_url)
            .field("bind_addr", &self.bind_addr)
            .field("pool_size", &self.pool_size)
            .field("api_token_owners", &owners)
            .field("allowed_hosts", &self.allowed_hosts)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `DATABASE_URL`: SQLite file path (default "ladle.db")
    /// - `LADLE_BIND_ADDR`: listen address (default "0.0.0.0:3000")
    /// - `LADLE_DB_POOL_SIZE`: connection pool size (default 8)
    /// - `LADLE_API_TOKENS`: comma-separated `owner_id=token` pairs
    /// - `SCRAPE_ALLOWED_HOSTS`: comma-separated hosts or `host:port` entries
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = parse_var(
            &lookup,
            "LADLE_BIND_ADDR",
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        )?;

        let pool_size = parse_var(&lookup, "LADLE_DB_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(invalid("LADLE_DB_POOL_SIZE", "0"));
        }

        let api_tokens = match lookup("LADLE_API_TOKENS") {
            Some(raw) => parse_tokens(&raw)?,
            None => Vec::new(),
        };

        let allowed_hosts = lookup("SCRAPE_ALLOWED_HOSTS")
            .map(|raw| {
                raw.split(',')
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            bind_addr,
            pool_size,
            api_tokens,
            allowed_hosts,
        })
    }
}

fn parse_tokens(raw: &str) -> Result<Vec<(OwnerId, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (owner, token) = entry
                .split_once('=')
                .ok_or_else(|| invalid("LADLE_API_TOKENS", "<redacted>"))?;
            // Never echo the token itself in an error.
            let shown = format!("{}=<redacted>", owner.trim());
            let owner = owner
                .trim()
                .parse::<OwnerId>()
                .map_err(|_| invalid("LADLE_API_TOKENS", &shown))?;
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid("LADLE_API_TOKENS", &shown));
            }
            Ok((owner, token.to_string()))
        })
        .collect()
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(value) => value.trim().parse().map_err(|_| invalid(key, &value)),
        None => Ok(default),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
