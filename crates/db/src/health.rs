use async_trait::async_trait;
use thermo_core::health::{HealthCheck, HealthStatus};

use crate::DbPool;

/// Liveness check that passes while the database answers `SELECT 1`.
///
/// Shared by the registry heartbeat and the `/health` endpoint.
#[derive(Clone)]
pub struct DbHealthCheck {
    pool: DbPool,
}

impl DbHealthCheck {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for DbHealthCheck {
    async fn check(&self) -> HealthStatus {
        match crate::health_check(&self.pool).await {
            Ok(()) => HealthStatus::passing(),
            Err(e) => HealthStatus::failing(format!("database unreachable: {e}")),
        }
    }
}
