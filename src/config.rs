use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TestUtilError};
use crate::script::ScriptConfig;

/// Environment variable overriding the listener address
pub const BIND_ADDR_ENV: &str = "TESTUTIL_BIND_ADDR";
/// Environment variable setting the client timeout in seconds
pub const CLIENT_TIMEOUT_ENV: &str = "TESTUTIL_CLIENT_TIMEOUT_SECS";

/// Settings for a scripted test server
///
/// ```toml
/// bind_addr = "127.0.0.1:0"
/// client_timeout_secs = 5
///
/// [script]
/// statuses = [503, 200]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to; port 0 picks an ephemeral port
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Timeout applied to every request made by the server's client
    #[serde(default)]
    pub client_timeout_secs: Option<u64>,
    /// Script installed when the server starts
    #[serde(default)]
    pub script: ScriptConfig,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            client_timeout_secs: None,
            script: ScriptConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TestUtilError::Config(format!("Failed to read config file: {}", e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            config.bind_addr = addr.trim().parse::<SocketAddr>().map_err(|e| {
                TestUtilError::Config(format!("{} is not a socket address: {}", BIND_ADDR_ENV, e))
            })?;
        }

        if let Ok(secs) = std::env::var(CLIENT_TIMEOUT_ENV) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                TestUtilError::Config(format!(
                    "{} is not a number of seconds: {}",
                    CLIENT_TIMEOUT_ENV, e
                ))
            })?;
            config.client_timeout_secs = Some(secs);
        }

        Ok(config)
    }

    /// Client timeout as a [`Duration`]
    pub fn client_timeout(&self) -> Option<Duration> {
        self.client_timeout_secs.map(Duration::from_secs)
    }
}
