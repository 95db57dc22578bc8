//! Process configuration.
//!
//! Everything except secrets that belong in `.env` comes from one YAML file:
//!
//! ```yaml
//! server:            # optional
//!   host: 0.0.0.0
//!   port: 8080       # defaults to consul-client.client-port
//! dbconfig: { host, port, dbname, username, password, device-id }
//! consul-client: { consul-server-ip, ttl, client-port, client-address, service-name }
//! sensor: { device-path, interval }   # optional
//! retention: { max-age, interval }    # optional
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use thermo_core::duration::parse_duration;
use thermo_db::config::MAX_DEVICE_ID_LEN;
use thermo_db::DbConfig;
use thermo_registry::{RegistryConfig, RegistryError};
use thermo_sensor::SensorConfig;

use crate::background::retention;

/// Config file used when `CONFIG_PATH` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retention_interval() -> String {
    "1h".to_string()
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Falls back to the advertised `client-port` when absent.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Periodic purge of old measurements for this device.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetentionConfig {
    pub max_age: String,
    #[serde(default = "default_retention_interval")]
    pub interval: String,
}

impl RetentionConfig {
    pub fn max_age(&self) -> Result<Duration, ConfigError> {
        let max_age = parse_duration(&self.max_age)
            .map_err(|e| ConfigError::Invalid(format!("retention.max-age: {e}")))?;
        if retention::cutoff(Utc::now(), max_age).is_none() {
            return Err(ConfigError::Invalid(format!(
                "retention.max-age '{}' is out of range",
                self.max_age
            )));
        }
        Ok(max_age)
    }

    pub fn interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.interval)
            .map_err(|e| ConfigError::Invalid(format!("retention.interval: {e}")))
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub dbconfig: DbConfig,
    pub consul_client: RegistryConfig,
    #[serde(default)]
    pub sensor: Option<SensorConfig>,
    #[serde(default)]
    pub retention: Option<RetentionConfig>,
    /// Taken from `DATABASE_URL`; replaces the `dbconfig` connection fields.
    #[serde(skip)]
    pub database_url: Option<String>,
}

impl AppConfig {
    /// Load from `CONFIG_PATH` (default `config.yml`) and apply the
    /// `DATABASE_URL` override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::load(Path::new(&path))?;
        config.database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject anything that would only fail later, after side effects.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let device_id = self.device_id();
        if device_id.is_empty() {
            return Err(ConfigError::Invalid(
                "dbconfig.device-id must not be empty".into(),
            ));
        }
        if device_id.len() > MAX_DEVICE_ID_LEN {
            return Err(ConfigError::Invalid(format!(
                "dbconfig.device-id must be at most {MAX_DEVICE_ID_LEN} characters"
            )));
        }

        self.consul_client.registration()?;
        self.listen_addr()?;

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.request-timeout-secs must be positive".into(),
            ));
        }

        if let Some(sensor) = self.sensor.as_ref().filter(|s| s.enabled) {
            sensor
                .interval()
                .map_err(|e| ConfigError::Invalid(format!("sensor.interval: {e}")))?;
        }

        if let Some(retention) = &self.retention {
            retention.max_age()?;
            retention.interval()?;
        }

        Ok(())
    }

    pub fn device_id(&self) -> &str {
        self.dbconfig.device_id.trim()
    }

    /// Socket address to bind the HTTP server to.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host: IpAddr = self.server.host.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "server.host '{}' is not an IP address",
                self.server.host
            ))
        })?;
        let port = match self.server.port {
            Some(port) => port,
            None => self.consul_client.port()?,
        };
        Ok(SocketAddr::new(host, port))
    }

    /// The sensor section, if sampling is enabled.
    pub fn enabled_sensor(&self) -> Option<&SensorConfig> {
        self.sensor.as_ref().filter(|s| s.enabled)
    }
}
