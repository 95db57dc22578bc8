use async_trait::async_trait;

use crate::error::RegistryError;
use crate::ttl::Ttl;

/// Everything the registry needs to know about this service instance.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    pub id: String,
    pub name: String,
    /// Address advertised to clients that look the service up.
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub ttl: Ttl,
}

impl ServiceRegistration {
    /// Id of the TTL check attached to the service entry.
    pub fn check_id(&self) -> String {
        format!("service:{}", self.id)
    }
}

/// Remote service-discovery agent.
///
/// One method per registry operation; every call is a single round-trip and
/// none of them retry.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Create the service entry together with its TTL check.
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), RegistryError>;

    /// Mark the TTL check as passing.
    async fn pass_ttl(&self, check_id: &str, note: &str) -> Result<(), RegistryError>;

    /// Mark the TTL check as failing with `reason`.
    async fn fail_ttl(&self, check_id: &str, reason: &str) -> Result<(), RegistryError>;

    /// Remove the service entry.
    async fn deregister(&self, service_id: &str) -> Result<(), RegistryError>;
}
