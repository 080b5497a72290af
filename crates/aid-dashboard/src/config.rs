//! # Dashboard Configuration
//!
//! Environment-based configuration for the dashboard binary.

use aid_warehouse::ReadStrategy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DashboardError, Result};

/// Query cache backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheBackend {
    /// No memoization, every fetch hits the warehouse
    None,
    #[default]
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(DashboardError::Config(format!("unknown cache backend '{other}'"))),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// DuckDB database file, in-memory when unset
    pub duckdb_path: Option<PathBuf>,

    /// Directory of `<table>.csv` / `<table>.parquet` extracts to import
    pub import_dir: Option<PathBuf>,

    /// Query cache configuration
    pub cache: CacheSettings,

    /// Logging level
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

/// Query cache configuration
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub ttl: Duration,
    pub strategy: ReadStrategy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            ttl: aid_warehouse::cache::DEFAULT_TTL,
            strategy: ReadStrategy::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duckdb_path: None,
            import_dir: None,
            cache: CacheSettings::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let ttl = match var("CACHE_TTL_SECS") {
            Some(v) => Duration::from_secs(v.trim().parse().map_err(|_| {
                DashboardError::Config(format!("invalid CACHE_TTL_SECS '{v}'"))
            })?),
            None => defaults.cache.ttl,
        };

        Ok(Self {
            duckdb_path: var("DUCKDB_PATH")
                .filter(|v| v != ":memory:")
                .map(PathBuf::from),

            import_dir: var("IMPORT_DIR").map(PathBuf::from),

            cache: CacheSettings {
                backend: var("CACHE_BACKEND")
                    .map(|v| v.parse::<CacheBackend>())
                    .transpose()?
                    .unwrap_or(defaults.cache.backend),
                redis_url: var("REDIS_URL").unwrap_or(defaults.cache.redis_url),
                ttl,
                strategy: var("READ_STRATEGY")
                    .map(|v| v.parse::<ReadStrategy>())
                    .transpose()?
                    .unwrap_or(defaults.cache.strategy),
            },

            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),

            log_format: match var("LOG_FORMAT").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(config.duckdb_path.is_none());
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.strategy, ReadStrategy::CacheFirst);
        assert_eq!(config.log_format, LogFormat::Plain);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DUCKDB_PATH", "/var/lib/dashboard.duckdb"),
            ("CACHE_BACKEND", "redis"),
            ("CACHE_TTL_SECS", "60"),
            ("READ_STRATEGY", "read_through"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(
            config.duckdb_path,
            Some(PathBuf::from("/var/lib/dashboard.duckdb"))
        );
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.ttl, Duration::from_secs(60));
        assert_eq!(config.cache.strategy, ReadStrategy::ReadThrough);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_memory_path_means_in_memory() {
        let config = Config::from_lookup(lookup(&[("DUCKDB_PATH", ":memory:")])).unwrap();
        assert!(config.duckdb_path.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("CACHE_TTL_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("CACHE_BACKEND", "memcached")])).is_err());
        assert!(Config::from_lookup(lookup(&[("READ_STRATEGY", "write_back")])).is_err());
    }
}
