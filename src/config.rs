use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::core::state::runtime::cluster::log_buffer::{DEFAULT_MAX_LOG_BYTES, DEFAULT_MAX_LOG_LINES};
use crate::errors::ConfigError;

pub const DEFAULT_NOMAD_ADDR: &str = "http://127.0.0.1:4646";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_EVENT_INDEX: u64 = 1000;
pub const DEFAULT_LOG_OFFSET: u64 = 20_000;

/// Connection settings for the Nomad HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NomadConfig {
    pub address: String,
    pub token: Option<String>,
    pub region: Option<String>,
    pub namespace: Option<String>,
    /// Bytes before the end of a task log where a tail starts.
    pub log_offset: u64,
}

impl Default for NomadConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_NOMAD_ADDR.to_string(),
            token: None,
            region: None,
            namespace: None,
            log_offset: DEFAULT_LOG_OFFSET,
        }
    }
}

/// Tuning for the background sync work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    pub refresh_interval: Duration,
    pub event_start_index: u64,
    pub log_max_lines: usize,
    pub log_max_bytes: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            event_start_index: DEFAULT_EVENT_INDEX,
            log_max_lines: DEFAULT_MAX_LOG_LINES,
            log_max_bytes: DEFAULT_MAX_LOG_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub nomad: NomadConfig,
    pub watcher: WatcherConfig,
    /// Where tracing output goes. Unset keeps the terminal clean.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self::from_env()?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let refresh_secs: u64 = parse_or(&get, "DAMON_REFRESH_INTERVAL_SECS", 2)?;
        if refresh_secs == 0 {
            return Err(invalid("DAMON_REFRESH_INTERVAL_SECS", "0", "must be at least 1"));
        }

        let log_max_lines: usize =
            parse_or(&get, "DAMON_LOG_MAX_LINES", DEFAULT_MAX_LOG_LINES)?;
        if log_max_lines == 0 {
            return Err(invalid("DAMON_LOG_MAX_LINES", "0", "must be at least 1"));
        }

        let log_max_bytes: usize =
            parse_or(&get, "DAMON_LOG_MAX_BYTES", DEFAULT_MAX_LOG_BYTES)?;
        if log_max_bytes == 0 {
            return Err(invalid("DAMON_LOG_MAX_BYTES", "0", "must be at least 1"));
        }

        Ok(Self {
            nomad: NomadConfig {
                address: get("NOMAD_ADDR").unwrap_or_else(|| DEFAULT_NOMAD_ADDR.to_string()),
                token: get("NOMAD_TOKEN"),
                region: get("NOMAD_REGION"),
                namespace: get("NOMAD_NAMESPACE"),
                log_offset: parse_or(&get, "DAMON_LOG_OFFSET", DEFAULT_LOG_OFFSET)?,
            },
            watcher: WatcherConfig {
                refresh_interval: Duration::from_secs(refresh_secs),
                event_start_index: parse_or(&get, "DAMON_EVENT_INDEX", DEFAULT_EVENT_INDEX)?,
                log_max_lines,
                log_max_bytes,
            },
            log_dir: get("DAMON_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| invalid(key, &raw, &e.to_string())),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
