//! Configuration for the Handoff server
//!
//! This module contains the configuration types and loading functionality.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Base URL under which flows are reachable from the outside; printed
    /// in logs so operators can hand the link to whoever must answer
    #[serde(default)]
    pub public_url: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> ServerResult<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override from environment variables
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            } else {
                warn!("Invalid SERVER_PORT value: {}", port);
            }
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Ok(public_url) = env::var("PUBLIC_URL") {
            config.public_url = Some(public_url);
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        if config.public_url.is_none() {
            warn!("No PUBLIC_URL provided - flow links will point at localhost");
        }

        config.validate()?;

        info!("Loaded server configuration");
        Ok(config)
    }

    /// Validate loaded values; flow links are built from `public_url`, so
    /// it must be an http(s) URL when set.
    fn validate(&self) -> ServerResult<()> {
        if let Some(url) = &self.public_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ServerError::ConfigError(format!(
                    "PUBLIC_URL must be an http(s) URL, got: {}",
                    url
                )));
            }
        }
        Ok(())
    }

    /// The base URL flows are advertised under: the configured public URL,
    /// or a localhost fallback derived from the port.
    pub fn endpoint_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }

    /// The socket address to bind the listener to
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            public_url: None,
            log_level: default_log_level(),
        }
    }
}
