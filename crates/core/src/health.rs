//! Point-in-time liveness signal shared by the registry heartbeat and the
//! HTTP `/health` endpoint.

use async_trait::async_trait;
use serde::Serialize;

/// Result of a single health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Set only when `healthy` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HealthStatus {
    pub fn passing() -> Self {
        Self {
            healthy: true,
            reason: None,
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            healthy: false,
            reason: Some(reason.into()),
        }
    }
}

/// A liveness check.
///
/// Implementations must be cheap enough to run on every heartbeat tick and
/// must not panic; failures are expressed through [`HealthStatus::failing`].
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> HealthStatus;
}

/// Check that always reports healthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHealthy;

#[async_trait]
impl HealthCheck for AlwaysHealthy {
    async fn check(&self) -> HealthStatus {
        HealthStatus::passing()
    }
}
