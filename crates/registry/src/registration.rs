use std::sync::Arc;

use thermo_core::health::HealthCheck;

use crate::error::RegistryError;
use crate::heartbeat::HeartbeatTask;
use crate::registry::{ServiceRegistration, ServiceRegistry};
use crate::ttl::Ttl;

/// Proof that the registry accepted this service.
///
/// Owned by whoever started the process; pass it around instead of keeping
/// registry state in globals.
pub struct RegistrationHandle {
    registry: Arc<dyn ServiceRegistry>,
    service_id: String,
    check_id: String,
    ttl: Ttl,
    heartbeat: Option<HeartbeatTask>,
}

impl std::fmt::Debug for RegistrationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationHandle")
            .field("service_id", &self.service_id)
            .field("check_id", &self.check_id)
            .field("ttl", &self.ttl)
            .field("heartbeat", &self.heartbeat.is_some())
            .finish_non_exhaustive()
    }
}

impl RegistrationHandle {
    /// Register the service. Any failure here is meant to abort startup.
    pub async fn register(
        registry: Arc<dyn ServiceRegistry>,
        registration: &ServiceRegistration,
    ) -> Result<Self, RegistryError> {
        tracing::info!(
            service_id = %registration.id,
            service_name = %registration.name,
            address = %registration.address,
            port = registration.port,
            ttl = %registration.ttl,
            "Registering service"
        );

        registry.register(registration).await?;

        tracing::info!(service_id = %registration.id, "Service registered");

        Ok(Self {
            registry,
            service_id: registration.id.clone(),
            check_id: registration.check_id(),
            ttl: registration.ttl.clone(),
            heartbeat: None,
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    pub fn ttl(&self) -> &Ttl {
        &self.ttl
    }

    pub fn is_heartbeat_running(&self) -> bool {
        self.heartbeat.is_some()
    }

    /// Start reporting `check` every half TTL.
    ///
    /// At most one heartbeat runs per registration.
    pub fn start_heartbeat(&mut self, check: Arc<dyn HealthCheck>) -> Result<(), RegistryError> {
        if self.heartbeat.is_some() {
            return Err(RegistryError::HeartbeatAlreadyRunning);
        }

        self.heartbeat = Some(HeartbeatTask::spawn(
            Arc::clone(&self.registry),
            self.check_id.clone(),
            self.ttl.heartbeat_period(),
            check,
        ));
        Ok(())
    }

    /// Stop the heartbeat and remove the service from the registry.
    ///
    /// Best effort: a failed deregistration is logged and otherwise ignored.
    /// The call is not bounded here; a registry client without its own
    /// request timeout can hold up shutdown.
    pub async fn deregister(mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.stop().await;
        }

        match self.registry.deregister(&self.service_id).await {
            Ok(()) => tracing::info!(service_id = %self.service_id, "Service deregistered"),
            Err(e) => tracing::warn!(
                service_id = %self.service_id,
                error = %e,
                "Failed to deregister service"
            ),
        }
    }
}
