use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, EchoError, Result};

/// Environment variable carrying a whole YAML config document.
pub const CONFIG_ENV: &str = "ECHO_CONFIG";
pub const HOST_ENV: &str = "ECHO_HOST";
pub const PORT_ENV: &str = "ECHO_PORT";
pub const CORS_ENV: &str = "ECHO_CORS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EchoConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Cross-origin policy. When enabled every response carries a permissive
/// `Access-Control-Allow-Origin` header and preflight requests are answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

pub fn load_config(config_path: Option<&str>) -> Result<EchoConfig> {
    let config = match config_path {
        Some(path) => EchoConfig::from_file(path)?,
        None => EchoConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

impl EchoConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            origin: path.to_string(),
            error: Box::new(e),
        })?;
        Self::from_yaml(&content, path)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup: an optional YAML
    /// document under [`CONFIG_ENV`], then per-field overrides on top.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(doc) => Self::from_yaml(&doc, CONFIG_ENV)?,
            None => Self::default(),
        };

        if let Some(host) = lookup(HOST_ENV) {
            config.server.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                message: format!("{PORT_ENV} must be a port number, got {port:?}"),
            })?;
        }
        if let Some(cors) = lookup(CORS_ENV) {
            config.cors.enabled = parse_flag(&cors).ok_or_else(|| ConfigError::Invalid {
                message: format!("{CORS_ENV} must be true/false/1/0, got {cors:?}"),
            })?;
        }

        Ok(config)
    }

    fn from_yaml(doc: &str, origin: &str) -> Result<Self> {
        // an empty document means "all defaults"
        if doc.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(doc).map_err(|e| {
            EchoError::Config(ConfigError::LoadFailed {
                origin: origin.to_string(),
                error: Box::new(e),
            })
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "server host cannot be empty".to_string(),
            }
            .into());
        }
        if self.server.port == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "server port cannot be zero".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
