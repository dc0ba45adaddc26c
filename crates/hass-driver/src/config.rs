//! Driver configuration: connection parameters and the point registry.
//!
//! A configuration file holds a `connection` table and a `points` list:
//!
//! ```toml
//! [connection]
//! ip_address = "192.168.1.100"
//! access_token = "long-lived-token"
//! port = 8123
//!
//! [[points]]
//! "Entity ID" = "light.kitchen"
//! "Entity Point" = "state"
//! "Point Name" = "kitchen_light"
//! "Writable" = "TRUE"
//! "Type" = "int"
//! ```
//!
//! Files ending in `.toml` are read as TOML, anything else as JSON.

use crate::entities::HassConnectionConfig;
use crate::error::{DriverError, DriverResult};
use crate::register::PointDefinition;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

/// Environment variable names.
pub mod env_vars {
    /// Access token used when the configuration leaves it empty
    pub const ACCESS_TOKEN: &str = "HASS_ACCESS_TOKEN";
    /// `true` switches CLI logging to JSON
    pub const LOG_JSON: &str = "HASS_DRIVER_LOG_JSON";
}

/// Port given either as a number or as a string (`"8123"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSetting {
    Number(i64),
    Text(String),
}

impl PortSetting {
    fn parse(&self) -> Option<u16> {
        match self {
            Self::Number(n) => u16::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Connection parameters supplied by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionParams {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub port: Option<PortSetting>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionParams {
    pub fn new(ip_address: &str, access_token: &str, port: u16) -> Self {
        Self {
            ip_address: Some(ip_address.to_string()),
            access_token: Some(access_token.to_string()),
            port: Some(PortSetting::Number(i64::from(port))),
            timeout_secs: None,
        }
    }

    /// Fill an empty access token from an override (usually the environment).
    pub fn apply_token_override(&mut self, token: Option<String>) {
        let missing = self
            .access_token
            .as_deref()
            .map_or(true, |t| t.trim().is_empty());
        if missing {
            if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
                self.access_token = Some(token);
            }
        }
    }

    /// Validate the parameters and build the client configuration.
    pub fn connection_config(&self) -> DriverResult<HassConnectionConfig> {
        let ip_address = match self.ip_address.as_deref().map(str::trim) {
            Some(ip) if !ip.is_empty() => ip,
            _ => {
                error!("IP address is not set.");
                return Err(DriverError::Configuration("IP address is required.".into()));
            }
        };
        let access_token = match self.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => {
                error!("Access token is not set.");
                return Err(DriverError::Configuration(
                    "Access token is required.".into(),
                ));
            }
        };
        let port = match &self.port {
            Some(setting) => setting.parse().ok_or_else(|| {
                error!("Port {:?} is not a valid port number.", setting);
                DriverError::Configuration(format!("Invalid port: {:?}", setting))
            })?,
            None => {
                error!("Port is not set.");
                return Err(DriverError::Configuration("Port is required.".into()));
            }
        };

        let config = HassConnectionConfig::new(ip_address, port, access_token);
        Ok(match self.timeout_secs {
            Some(secs) => config.with_timeout(secs),
            None => config,
        })
    }
}

/// Complete driver configuration, as stored in a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub connection: ConnectionParams,
    #[serde(default)]
    pub points: Vec<PointDefinition>,
}

impl DriverConfig {
    /// Load a configuration file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DriverError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let mut config = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
        .map_err(|e| match e {
            DriverError::Configuration(msg) => {
                DriverError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        config
            .connection
            .apply_token_override(std::env::var(env_vars::ACCESS_TOKEN).ok());

        info!(
            category = "config",
            points = config.points.len(),
            "Loading config from: {}",
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> DriverResult<Self> {
        toml::from_str(content).map_err(|e| DriverError::Configuration(e.to_string()))
    }

    pub fn from_json(content: &str) -> DriverResult<Self> {
        serde_json::from_str(content).map_err(|e| DriverError::Configuration(e.to_string()))
    }
}
