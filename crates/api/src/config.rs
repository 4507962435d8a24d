//! Process configuration, read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `STOCKFLOW_BIND_ADDR` | `0.0.0.0:8089` |
//! | `DATABASE_URL` | `sqlite://stockflow.db?mode=rwc` |
//! | `STOCKFLOW_USE_IN_MEMORY_STORE` | `false` |
//! | `STOCKFLOW_DB_MAX_CONNECTIONS` | `5` |
//! | `STOCKFLOW_DB_BUSY_TIMEOUT_MS` | `5000` |
//! | `STOCKFLOW_CALL_TIMEOUT_MS` | `10000` |
//! | `STOCKFLOW_AUDIT_TIMEOUT_MS` | `2000` |
//! | `STOCKFLOW_SEED_DEV_CREDENTIALS` | `false` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};

use stockflow_auth::Role;

/// API keys provisioned when `STOCKFLOW_SEED_DEV_CREDENTIALS` is set.
pub const DEV_CREDENTIALS: &[(&str, Role)] = &[
    ("customer-key-123", Role::CUSTOMER),
    ("admin-key-456", Role::ADMIN),
    ("admin-key-789", Role::ADMIN),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub use_in_memory_store: bool,
    pub db_max_connections: u32,
    pub db_busy_timeout: Duration,
    pub call_timeout: Duration,
    pub audit_timeout: Duration,
    pub seed_dev_credentials: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8089)),
            database_url: "sqlite://stockflow.db?mode=rwc".to_string(),
            use_in_memory_store: false,
            db_max_connections: 5,
            db_busy_timeout: Duration::from_millis(5000),
            call_timeout: Duration::from_millis(10_000),
            audit_timeout: Duration::from_millis(2000),
            seed_dev_credentials: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset variables keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: parse(&lookup, "STOCKFLOW_BIND_ADDR", defaults.bind_addr)?,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            use_in_memory_store: flag(
                &lookup,
                "STOCKFLOW_USE_IN_MEMORY_STORE",
                defaults.use_in_memory_store,
            )?,
            db_max_connections: parse(
                &lookup,
                "STOCKFLOW_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            db_busy_timeout: millis(&lookup, "STOCKFLOW_DB_BUSY_TIMEOUT_MS", defaults.db_busy_timeout)?,
            call_timeout: millis(&lookup, "STOCKFLOW_CALL_TIMEOUT_MS", defaults.call_timeout)?,
            audit_timeout: millis(&lookup, "STOCKFLOW_AUDIT_TIMEOUT_MS", defaults.audit_timeout)?,
            seed_dev_credentials: flag(
                &lookup,
                "STOCKFLOW_SEED_DEV_CREDENTIALS",
                defaults.seed_dev_credentials,
            )?,
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid {key}: {raw:?}")),
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    let ms: u64 = parse(lookup, key, default.as_millis() as u64)?;
    if ms == 0 {
        return Err(anyhow!("invalid {key}: must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> anyhow::Result<bool> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(anyhow!("invalid {key}: {raw:?} is not a boolean")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_variables_use_defaults() {
        assert_eq!(from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let config = from(&[
            ("STOCKFLOW_BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("STOCKFLOW_USE_IN_MEMORY_STORE", "true"),
            ("STOCKFLOW_DB_MAX_CONNECTIONS", "2"),
            ("STOCKFLOW_CALL_TIMEOUT_MS", "250"),
            ("STOCKFLOW_SEED_DEV_CREDENTIALS", "1"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.use_in_memory_store);
        assert_eq!(config.db_max_connections, 2);
        assert_eq!(config.call_timeout, Duration::from_millis(250));
        assert!(config.seed_dev_credentials);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(from(&[("STOCKFLOW_BIND_ADDR", "nowhere")]).is_err());
        assert!(from(&[("STOCKFLOW_DB_MAX_CONNECTIONS", "-1")]).is_err());
        assert!(from(&[("STOCKFLOW_CALL_TIMEOUT_MS", "0")]).is_err());
        assert!(from(&[("STOCKFLOW_USE_IN_MEMORY_STORE", "maybe")]).is_err());
    }
}
