//! Configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SECRET_KEY: &str = "secret-dev";
pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_STORAGE_PATH: &str = ".jobly/storage.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Token issuer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    pub secret_key: String,
}

impl IssuerConfig {
    /// Read `SECRET_KEY`, falling back to the development secret.
    #[must_use]
    pub fn from_env() -> Self {
        let secret_key = std::env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET_KEY.to_owned());
        if secret_key == DEFAULT_SECRET_KEY {
            tracing::warn!("SECRET_KEY not set; using development secret");
        }
        Self { secret_key }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl ClientTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Session client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub storage_path: PathBuf,
    pub timeouts: ClientTimeouts,
}

impl ClientConfig {
    /// Build client config from environment variables.
    ///
    /// - `JOBLY_API_URL`: API base URL, default `http://localhost:3001`
    /// - `JOBLY_STORAGE_PATH`: token storage file, default `.jobly/storage.json`
    /// - `JOBLY_REQUEST_TIMEOUT_SECS`: default 30
    /// - `JOBLY_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("JOBLY_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let storage_path = std::env::var("JOBLY_STORAGE_PATH")
            .map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);
        let timeouts = ClientTimeouts {
            request_secs: env_parse_u64("JOBLY_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("JOBLY_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self { base_url, storage_path, timeouts }
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
