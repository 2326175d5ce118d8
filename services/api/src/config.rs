//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Upper bound for `AUTH_SESSION_TTL_DAYS` (ten years).
const MAX_AUTH_SESSION_TTL_DAYS: i64 = 3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_open_conns: u32,
    pub db_idle_timeout: Duration,
    /// Deadline applied to every request.
    pub server_timeout: Duration,
    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_grace: Duration,
    pub log_level: Level,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub generation_model: String,
    pub auth_session_ttl_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address: SocketAddr = parse_or(&lookup, "BIND_ADDRESS", "0.0.0.0:8080")?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let db_max_open_conns: u32 = parse_or(&lookup, "DB_MAX_OPEN_CONNS", "10")?;
        if db_max_open_conns == 0 {
            return Err(ConfigError::InvalidValue(
                "DB_MAX_OPEN_CONNS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let db_idle_timeout_secs: u64 = parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", "10")?;
        let server_timeout_secs: u64 = parse_or(&lookup, "SERVER_TIMEOUT_SECS", "5")?;
        let shutdown_grace_secs: u64 = parse_or(&lookup, "SHUTDOWN_GRACE_SECS", "10")?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Generation provider (optional) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty());
        let openai_base_url = lookup("OPENAI_BASE_URL").filter(|u| !u.is_empty());
        let generation_model =
            lookup("GENERATION_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        let auth_session_ttl_days: i64 = parse_or(&lookup, "AUTH_SESSION_TTL_DAYS", "30")?;
        if !(1..=MAX_AUTH_SESSION_TTL_DAYS).contains(&auth_session_ttl_days) {
            return Err(ConfigError::InvalidValue(
                "AUTH_SESSION_TTL_DAYS".to_string(),
                format!("must be between 1 and {}", MAX_AUTH_SESSION_TTL_DAYS),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            db_max_open_conns,
            db_idle_timeout: Duration::from_secs(db_idle_timeout_secs),
            server_timeout: Duration::from_secs(server_timeout_secs),
            shutdown_grace: Duration::from_secs(shutdown_grace_secs),
            log_level,
            cors_origin,
            openai_api_key,
            openai_base_url,
            generation_model,
            auth_session_ttl_days,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
