//! Engine configuration.
//!
//! Values come from the process environment (or any lookup function in tests)
//! and fall back to the defaults the restaurant reviews API ships with.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, non_empty_trimmed};

/// Default API origin of the restaurant reviews server.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:1337";

const DEFAULT_DATABASE_PATH: &str = "mws.db";
const DEFAULT_CACHE_PATH: &str = "mws-cache.db";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration shared by every engine component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Origin of the remote data API, without trailing slash
    pub api_base_url: String,
    /// Path of the durable mirror (object stores and write queue)
    pub database_path: PathBuf,
    /// Path of the response cache database (images)
    pub cache_path: PathBuf,
    /// Per-request network timeout
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = value_or_default(&lookup, "MWS_API_BASE_URL", DEFAULT_API_BASE_URL);
        if !is_http_url(&api_base_url) {
            return Err(ConfigError::Invalid(
                "MWS_API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let database_path = optional_trimmed(&lookup, "MWS_DATABASE_PATH")
            .map_or(defaults.database_path, PathBuf::from);
        let cache_path =
            optional_trimmed(&lookup, "MWS_CACHE_PATH").map_or(defaults.cache_path, PathBuf::from);

        let timeout_secs = value_or_default(
            &lookup,
            "MWS_REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|_| {
            ConfigError::Invalid("MWS_REQUEST_TIMEOUT_SECS must be an integer in [1, 300]".into())
        })?;
        if !(1..=300).contains(&timeout_secs) {
            return Err(ConfigError::Invalid(
                "MWS_REQUEST_TIMEOUT_SECS must be in [1, 300]".to_string(),
            ));
        }

        Ok(Self {
            api_base_url: trim_trailing(&api_base_url).to_string(),
            database_path,
            cache_path,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Override the API origin (used by the CLI `--api-url` flag).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = trim_trailing(&url.into()).to_string();
        self
    }

    /// Override the mirror path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Absolute URL for an API path such as `/restaurants/3`.
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.api_base_url)
        } else {
            format!("{}/{path}", self.api_base_url)
        }
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).as_deref().and_then(non_empty_trimmed)
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}
