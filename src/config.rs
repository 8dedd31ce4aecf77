use std::{net::SocketAddr, str::FromStr, time::Duration};

use dotenvy::dotenv;
use thiserror::Error;

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);
const DEFAULT_DATABASE_URL: &str = "mdnotes.sqlite3";
const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LOG_FILTER: &str = "mdnotes=info,tower_http=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value `{value}`: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("DATABASE_URL must point at a file; in-memory SQLite is not shared across pooled connections")]
    InMemoryDatabase,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
    pub connection_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub log_filter: String,
}

impl AppConfig {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or("MDNOTES_BIND_ADDR", &lookup, || {
            SocketAddr::from(DEFAULT_BIND_ADDR)
        })?;

        let url = lookup("DATABASE_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        if url == ":memory:" || url.contains("mode=memory") {
            return Err(ConfigError::InMemoryDatabase);
        }

        let pool_max_size = parse_or("DATABASE_POOL_SIZE", &lookup, || DEFAULT_POOL_SIZE)?;
        if pool_max_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE",
                value: pool_max_size.to_string(),
                reason: "pool size must be at least 1".to_string(),
            });
        }

        let timeout_secs = parse_or("DATABASE_CONNECT_TIMEOUT_SECS", &lookup, || {
            DEFAULT_CONNECT_TIMEOUT_SECS
        })?;

        let log_filter = lookup("RUST_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            bind_addr,
            database: DatabaseConfig {
                url,
                pool_max_size,
                connection_timeout: Duration::from_secs(timeout_secs),
            },
            log_filter,
        })
    }
}

fn parse_or<T, F, D>(key: &'static str, lookup: &F, default: D) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
    D: FnOnce() -> T,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|err: T::Err| ConfigError::InvalidValue {
                    key,
                    value: raw.clone(),
                    reason: err.to_string(),
                })
        }
        _ => Ok(default()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.database.pool_max_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.database.connection_timeout, Duration::from_secs(5));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("MDNOTES_BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "/var/lib/mdnotes/notes.db"),
            ("DATABASE_POOL_SIZE", "2"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database.url, "/var/lib/mdnotes/notes.db");
        assert_eq!(config.database.pool_max_size, 2);
    }

    #[test]
    fn test_invalid_pool_size_names_variable() {
        let err = config_from(&[("DATABASE_POOL_SIZE", "many")]).unwrap_err();
        assert!(err.to_string().starts_with("DATABASE_POOL_SIZE"));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        assert!(config_from(&[("DATABASE_POOL_SIZE", "0")]).is_err());
    }

    #[test]
    fn test_in_memory_database_rejected() {
        let err = config_from(&[("DATABASE_URL", ":memory:")]).unwrap_err();
        assert!(matches!(err, ConfigError::InMemoryDatabase));
    }
}
