//! Startup configuration, read once from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use footfall_event_store::pool::{DEFAULT_MAX_CONNECTIONS, PoolSettings};

use crate::error::AppError;
use crate::state::CaptureSettings;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5050;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Listen address.
    pub addr: SocketAddr,
    /// Connection pool sizing and wait policy.
    pub pool: PoolSettings,
    /// Request-handling policy.
    pub capture: CaptureSettings,
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config("DATABASE_URL environment variable must be set".into()))?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;

        let max_connections: u32 =
            parse_or(&lookup, "FOOTFALL_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(AppError::Config(
                "FOOTFALL_DB_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }
        let acquire_timeout_secs: u64 = parse_or(
            &lookup,
            "FOOTFALL_DB_ACQUIRE_TIMEOUT_SECS",
            PoolSettings::default().acquire_timeout.as_secs(),
        )?;

        let trust_forwarded: bool = parse_or(&lookup, "FOOTFALL_TRUST_FORWARDED", true)?;
        let allowed_origins = lookup("FOOTFALL_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            addr,
            pool: PoolSettings {
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            capture: CaptureSettings {
                trust_forwarded,
                allowed_origins,
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}
