use std::time::Duration;

use serde::Deserialize;

use crate::consul::ConsulRegistry;
use crate::error::RegistryError;
use crate::registry::ServiceRegistration;
use crate::ttl::Ttl;

fn default_tags() -> Vec<String> {
    vec!["raspi".to_string(), "temperature".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// A port written either as a YAML number or a quoted string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortSetting {
    Number(u16),
    Text(String),
}

/// The `consul-client` section of the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryConfig {
    /// Agent address, `host:port` or a full URL.
    pub consul_server_ip: String,
    /// Check TTL in duration syntax, e.g. `10s`.
    pub ttl: String,
    /// Advertised (and listened-on) port.
    pub client_port: PortSetting,
    /// Advertised address.
    pub client_address: String,
    pub service_name: String,
    /// Defaults to `service_name`.
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    /// Consul ACL token.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl RegistryConfig {
    pub fn port(&self) -> Result<u16, RegistryError> {
        match &self.client_port {
            PortSetting::Number(port) => Ok(*port),
            PortSetting::Text(raw) => raw.trim().parse().map_err(|_| {
                RegistryError::InvalidConfig(format!("client-port '{raw}' is not a valid port"))
            }),
        }
    }

    pub fn ttl(&self) -> Result<Ttl, RegistryError> {
        Ok(Ttl::parse(&self.ttl)?)
    }

    /// Validate the section and build the registration it describes.
    pub fn registration(&self) -> Result<ServiceRegistration, RegistryError> {
        let name = self.service_name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidConfig(
                "service-name must not be empty".into(),
            ));
        }

        let address = self.client_address.trim();
        if address.is_empty() {
            return Err(RegistryError::InvalidConfig(
                "client-address must not be empty".into(),
            ));
        }

        let id = match self.service_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => name.to_string(),
        };

        Ok(ServiceRegistration {
            id,
            name: name.to_string(),
            address: address.to_string(),
            port: self.port()?,
            tags: self.tags.clone(),
            ttl: self.ttl()?,
        })
    }

    /// Build the Consul client this section points at.
    pub fn consul_client(&self) -> Result<ConsulRegistry, RegistryError> {
        ConsulRegistry::new(
            &self.consul_server_ip,
            self.token.clone(),
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}
