use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Selects which error renderer closes the HTTP error pipeline
    pub environment: Environment,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                http_port: 7777,
            },
            app: AppConfig {
                environment: Environment::Development,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    pub fn load_from(config_name: &str) -> Result<Self> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host.clone())?
            .set_default("server.http_port", i64::from(defaults.server.http_port))?
            .set_default("app.environment", defaults.app.environment.to_string())?
            .add_source(config::File::with_name(config_name).required(false))
            .add_source(
                config::Environment::with_prefix("ROOM_GATEWAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        match settings.try_deserialize() {
            Ok(config) => Ok(config),
            Err(_) => {
                tracing::warn!("Could not load config file {}, using defaults", config_name);
                Ok(defaults)
            }
        }
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.http_port)
            .parse()
            .map_err(|e| Error::Network(format!("Invalid HTTP address: {}", e)))
    }
}
