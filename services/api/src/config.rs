//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// Longest session lifetime accepted from `SESSION_TTL_DAYS` (about ten years).
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where reflections, users and auth sessions are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local maps; everything is lost on restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub session_ttl_days: i64,
    pub cors_origin: String,
    pub cookie_secure: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address =
            parse_var(&var, "BIND_ADDRESS", "0.0.0.0:3000".parse::<SocketAddr>().ok())?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage Settings ---
        let backend = var("STORAGE_BACKEND").unwrap_or_else(|| "postgres".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres {
                database_url: var("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of 'postgres' or 'memory'", other),
                ))
            }
        };
        let db_max_connections: u32 = parse_var(&var, "DB_MAX_CONNECTIONS", Some(5))?;

        // --- Auth and Browser Settings ---
        let session_ttl_days: i64 = parse_var(&var, "SESSION_TTL_DAYS", Some(30))?;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&session_ttl_days) {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                format!("must be between 1 and {} days", MAX_SESSION_TTL_DAYS),
            ));
        }
        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let cookie_secure = parse_var(&var, "COOKIE_SECURE", Some(true))?;

        Ok(Self {
            bind_address,
            storage,
            db_max_connections,
            log_level,
            session_ttl_days,
            cors_origin,
            cookie_secure,
        })
    }
}

/// Reads and parses `key`, falling back to `default` when it is unset.
fn parse_var<T, F>(var: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}
