//! Environment-driven configuration.
//!
//! The store connection string is optional here. Its absence is reported by
//! the store on first use, not at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_STATIC_DIR: &str = "frontend/dist";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store kind `{other}` (expected `redis` or `memory`)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store_kind: StoreKind,
    /// `REDIS_URL`; `None` means the store will refuse to connect.
    pub store_url: Option<String>,
    pub connect_timeout: Duration,
    pub app_host: String,
    pub app_port: u16,
    /// `None` disables static file serving.
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_kind: StoreKind::Redis,
            store_url: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            app_host: DEFAULT_HOST.to_string(),
            app_port: DEFAULT_PORT,
            static_dir: Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment, honoring a `.env`
    /// file when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_kind = parse_optional(&non_empty, "TASKS_STORE", defaults.store_kind)?;
        let timeout_ms = parse_optional(
            &non_empty,
            "TASKS_STORE_CONNECT_TIMEOUT_MS",
            DEFAULT_CONNECT_TIMEOUT_MS,
        )?;
        let app_port = parse_optional(&non_empty, "APP_PORT", defaults.app_port)?;

        let static_dir = match lookup("STATIC_DIR") {
            Some(dir) if dir.trim().is_empty() => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => defaults.static_dir,
        };

        Ok(Self {
            store_kind,
            store_url: non_empty("REDIS_URL"),
            connect_timeout: Duration::from_millis(timeout_ms),
            app_host: non_empty("APP_HOST").unwrap_or(defaults.app_host),
            app_port,
            static_dir,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}

fn parse_optional<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
