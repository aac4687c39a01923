use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;

use mws_core::{ConfigError, EngineConfig};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("MWS_PROXY_BIND_ADDR")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "MWS_PROXY_BIND_ADDR must be a socket address, got '{bind_addr}'"
            ))
        })?;

        Ok(Self {
            bind_addr,
            engine: EngineConfig::from_lookup(&lookup)?,
        })
    }
}
