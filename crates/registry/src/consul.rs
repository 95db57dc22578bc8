//! [`ServiceRegistry`] implementation backed by the Consul agent HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use crate::error::RegistryError;
use crate::registry::{ServiceRegistration, ServiceRegistry};

/// Header carrying the Consul ACL token.
const TOKEN_HEADER: &str = "X-Consul-Token";

/// Body of `PUT /v1/agent/service/register`.
#[derive(Debug, Serialize)]
struct ServiceDefinition<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Tags")]
    tags: &'a [String],
    #[serde(rename = "Address")]
    address: &'a str,
    #[serde(rename = "Port")]
    port: u16,
    #[serde(rename = "Check")]
    check: TtlCheckDefinition<'a>,
}

#[derive(Debug, Serialize)]
struct TtlCheckDefinition<'a> {
    #[serde(rename = "CheckID")]
    check_id: &'a str,
    #[serde(rename = "TTL")]
    ttl: &'a str,
}

/// Consul agent client.
pub struct ConsulRegistry {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ConsulRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsulRegistry")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl ConsulRegistry {
    /// Build a client for the agent at `address` (`host:port` or a full URL).
    ///
    /// `request_timeout` bounds every call, including deregistration at
    /// shutdown.
    pub fn new(
        address: &str,
        token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let address = address.trim().trim_end_matches('/');
        if address.is_empty() {
            return Err(RegistryError::InvalidConfig(
                "registry address must not be empty".into(),
            ));
        }

        let base_url = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };

        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RegistryError::InvalidConfig(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn put(&self, path: &str) -> RequestBuilder {
        let mut request = self.http.put(format!("{}/v1{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<(), RegistryError> {
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Rejected {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

#[async_trait]
impl ServiceRegistry for ConsulRegistry {
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), RegistryError> {
        let check_id = registration.check_id();
        let definition = ServiceDefinition {
            id: &registration.id,
            name: &registration.name,
            tags: &registration.tags,
            address: &registration.address,
            port: registration.port,
            check: TtlCheckDefinition {
                check_id: &check_id,
                ttl: registration.ttl.as_str(),
            },
        };
        self.send(self.put("/agent/service/register").json(&definition))
            .await
    }

    async fn pass_ttl(&self, check_id: &str, note: &str) -> Result<(), RegistryError> {
        self.send(
            self.put(&format!("/agent/check/pass/{check_id}"))
                .query(&[("note", note)]),
        )
        .await
    }

    async fn fail_ttl(&self, check_id: &str, reason: &str) -> Result<(), RegistryError> {
        self.send(
            self.put(&format!("/agent/check/fail/{check_id}"))
                .query(&[("note", reason)]),
        )
        .await
    }

    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError> {
        self.send(self.put(&format!("/agent/service/deregister/{service_id}")))
            .await
    }
}
