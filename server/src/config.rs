//! Configuration management for the server.

use fleet_engine::{DateGranularity, EngineConfig, DEFAULT_LIST_LIMIT};
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections
    pub database_max_connections: u32,
    /// Precision at which allocation dates collide
    pub granularity: DateGranularity,
    /// Maximum number of allocations returned by a listing
    pub list_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: None,
            database_max_connections: 10,
            granularity: DateGranularity::default(),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort)?,
            None => defaults.port,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidMaxConnections)?,
            None => defaults.database_max_connections,
        };

        let granularity = match lookup("ALLOCATION_DATE_GRANULARITY") {
            Some(raw) => raw
                .parse::<DateGranularity>()
                .map_err(ConfigError::InvalidGranularity)?,
            None => defaults.granularity,
        };

        let list_limit = match lookup("ALLOCATION_LIST_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidListLimit)?,
            None => defaults.list_limit,
        };

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            granularity,
            list_limit,
        })
    }

    /// Allocation engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            granularity: self.granularity,
            list_limit: self.list_limit,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("DATABASE_MAX_CONNECTIONS must be a positive integer")]
    InvalidMaxConnections,

    #[error("Invalid ALLOCATION_DATE_GRANULARITY: {0}")]
    InvalidGranularity(String),

    #[error("ALLOCATION_LIST_LIMIT must be a positive integer")]
    InvalidListLimit,
}
