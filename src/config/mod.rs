use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

// Top-level configuration container
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `json` switches the log output to JSON lines
    pub log_format: String,
    pub handler_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
    /// Applied per transaction as Postgres `lock_timeout`.
    pub lock_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub catalog_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_minutes: i64,
}

/// Settings shared by the reservation and settlement engines.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// How long a seat hold lasts before another user may reclaim it.
    pub hold_duration_secs: i64,
    /// Upper bound on the wait for a seat's row lock. Work done after the
    /// lock is granted, commit included, is not cut short.
    pub lock_wait_timeout_ms: u64,
}

impl BookingConfig {
    pub fn hold_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.hold_duration_secs)
    }

    pub fn lock_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_wait_timeout_ms)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig {
            hold_duration_secs: 600,
            lock_wait_timeout_ms: 5_000,
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn or_default(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = or_default(name, default);
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parsed("PORT", "8000")?,
                environment: or_default("ENVIRONMENT", "development"),
                rust_log: or_default("RUST_LOG", "seat_booking=debug,tower_http=debug"),
                log_format: or_default("LOG_FORMAT", "pretty"),
                handler_timeout_secs: parsed("HANDLER_TIMEOUT_SECS", "30")?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parsed("DB_POOL_SIZE", "20")?,
                acquire_timeout_secs: parsed("DB_ACQUIRE_TIMEOUT_SECS", "5")?,
                lock_timeout_ms: parsed("DB_LOCK_TIMEOUT_MS", "5000")?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
                catalog_ttl_secs: parsed("CATALOG_CACHE_TTL_SECS", "3600")?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                expires_in_minutes: parsed("JWT_EXPIRES_IN_MINUTES", "15")?,
            },
            booking: BookingConfig {
                hold_duration_secs: parsed("SEAT_LOCK_DURATION_SECS", "600")?,
                lock_wait_timeout_ms: parsed("SEAT_LOCK_WAIT_TIMEOUT_MS", "5000")?,
            },
        })
    }
}
