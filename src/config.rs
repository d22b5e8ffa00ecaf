use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Runtime configuration
///
/// Loaded from environment variables with defaults suited to a local demo.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Port for the /metrics and /health endpoints
    pub metrics_port: u16,

    /// Redis connection URL; unset selects the in-memory store
    pub redis_url: Option<String>,

    /// Prefix for every Redis key
    pub key_prefix: String,

    /// Deadline applied to each request's store calls
    pub store_timeout: Duration,

    /// Seed clubs and fixtures on startup
    pub seed_demo: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `METRICS_PORT` (default: 9090)
    /// - `REDIS_URL` (default: unset, in-memory store)
    /// - `STORE_KEY_PREFIX` (default: mock_epl)
    /// - `STORE_TIMEOUT_MS` (default: 5000)
    /// - `SEED_DEMO` (default: true)
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());
        let timeout_ms: u64 = parse_or(&lookup, "STORE_TIMEOUT_MS", 5_000)?;

        Ok(Self {
            metrics_port: parse_or(&lookup, "METRICS_PORT", 9090)?,
            redis_url,
            key_prefix: lookup("STORE_KEY_PREFIX").unwrap_or_else(|| "mock_epl".to_string()),
            store_timeout: Duration::from_millis(timeout_ms),
            seed_demo: parse_or(&lookup, "SEED_DEMO", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
