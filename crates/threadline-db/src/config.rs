//! Store configuration loaded from the environment.
//!
//! | Variable                  | Default | Meaning                        |
//! |---------------------------|---------|--------------------------------|
//! | `DATABASE_URL`            | none    | PostgreSQL URL (required)      |
//! | `DB_MAX_CONNECTIONS`      | 10      | Pool upper bound               |
//! | `DB_MIN_CONNECTIONS`      | 1       | Idle connections kept open     |
//! | `DB_CONNECT_TIMEOUT_SECS` | 30      | Acquire timeout                |
//! | `DB_IDLE_TIMEOUT_SECS`    | 600     | Idle connection timeout        |

use std::str::FromStr;
use std::time::Duration;

use threadline_core::{Error, Result};

use crate::pool::PoolConfig;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const ENV_MIN_CONNECTIONS: &str = "DB_MIN_CONNECTIONS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "DB_CONNECT_TIMEOUT_SECS";
pub const ENV_IDLE_TIMEOUT_SECS: &str = "DB_IDLE_TIMEOUT_SECS";

/// Connection settings for [`crate::Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub pool: PoolConfig,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: PoolConfig::default(),
        }
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(ENV_DATABASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", ENV_DATABASE_URL)))?;

        let mut pool = PoolConfig::default();
        if let Some(n) = parse_var(&lookup, ENV_MAX_CONNECTIONS)? {
            pool = pool.max_connections(n);
        }
        if let Some(n) = parse_var(&lookup, ENV_MIN_CONNECTIONS)? {
            pool = pool.min_connections(n);
        }
        if let Some(secs) = parse_var(&lookup, ENV_CONNECT_TIMEOUT_SECS)? {
            pool = pool.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var(&lookup, ENV_IDLE_TIMEOUT_SECS)? {
            pool = pool.idle_timeout(Duration::from_secs(secs));
        }

        if pool.min_connections > pool.max_connections {
            return Err(Error::Config(format!(
                "{} ({}) exceeds {} ({})",
                ENV_MIN_CONNECTIONS,
                pool.min_connections,
                ENV_MAX_CONNECTIONS,
                pool.max_connections
            )));
        }

        Ok(Self { database_url, pool })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            Error::Config(format!(
                "{} must be a non-negative integer, got '{}'",
                key, raw
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_only_url_is_set() {
        let config = StoreConfig::from_lookup(lookup(&[(ENV_DATABASE_URL, "postgres://x/db")]))
            .unwrap();
        assert_eq!(config.database_url, "postgres://x/db");
        assert_eq!(config.pool, PoolConfig::default());
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let err = StoreConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains(ENV_DATABASE_URL)));

        let err = StoreConfig::from_lookup(lookup(&[(ENV_DATABASE_URL, "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_pool_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DATABASE_URL, "postgres://x/db"),
            (ENV_MAX_CONNECTIONS, "25"),
            (ENV_MIN_CONNECTIONS, "2"),
            (ENV_CONNECT_TIMEOUT_SECS, "5"),
            (ENV_IDLE_TIMEOUT_SECS, " 60 "),
        ]))
        .unwrap();
        assert_eq!(config.pool.max_connections, 25);
        assert_eq!(config.pool.min_connections, 2);
        assert_eq!(config.pool.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.pool.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_malformed_number_is_config_error() {
        let err = StoreConfig::from_lookup(lookup(&[
            (ENV_DATABASE_URL, "postgres://x/db"),
            (ENV_MAX_CONNECTIONS, "many"),
        ]))
        .unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains(ENV_MAX_CONNECTIONS)),
            other => panic!("Expected Config, got {:?}", other),
        }
    }

    #[test]
    fn test_min_above_max_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[
            (ENV_DATABASE_URL, "postgres://x/db"),
            (ENV_MAX_CONNECTIONS, "2"),
            (ENV_MIN_CONNECTIONS, "3"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
