use std::net::SocketAddr;

use config::{Config, Environment};
use serde::Deserialize;
use tern::providers::openai::OPENAI_HOST;

use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::BadAddress(addr))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_upstream_host")]
    pub host: String,
    /// Bearer credential for the completion API. The server boots without
    /// one; requests then fail with a JSON 500 until it is provided.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        UpstreamSettings {
            host: default_upstream_host(),
            api_key: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
}

impl Settings {
    /// Loads settings from `TERN_`-prefixed environment variables layered
    /// over the built-in defaults, e.g. `TERN_SERVER__PORT=8080` or
    /// `TERN_UPSTREAM__API_KEY=sk-...`.
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Upstream defaults
            .set_default("upstream.host", default_upstream_host())?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("TERN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        // A bare OPENAI_API_KEY also works, matching what the upstream
        // vendor tooling reads.
        if settings.upstream.api_key.is_none() {
            settings.upstream.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.is_empty());
        }

        Ok(settings)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_host() -> String {
    OPENAI_HOST.to_string()
}
