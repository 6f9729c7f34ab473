use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default suited to a local, single-user install.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub rust_log: String,
    /// When unset the service keeps its data in memory.
    pub redis_url: Option<String>,
    pub storage_prefix: String,
    pub max_upload_bytes: usize,
    pub export_max_bytes: usize,
    pub autosave_debounce: Duration,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_EXPORT_MAX_BYTES: usize = 5 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            bind_addr: optional_env("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            redis_url: optional_env("REDIS_URL"),
            storage_prefix: optional_env("STORAGE_PREFIX")
                .unwrap_or_else(|| "cvstudio".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            export_max_bytes: parse_env("EXPORT_MAX_BYTES", DEFAULT_EXPORT_MAX_BYTES)
                .context("EXPORT_MAX_BYTES must be a byte count")?,
            autosave_debounce: Duration::from_millis(
                parse_env("AUTOSAVE_DEBOUNCE_MS", 1000u64)
                    .context("AUTOSAVE_DEBOUNCE_MS must be a number of milliseconds")?,
            ),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            redis_url: None,
            storage_prefix: "cvstudio".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            export_max_bytes: DEFAULT_EXPORT_MAX_BYTES,
            autosave_debounce: Duration::from_millis(1000),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
