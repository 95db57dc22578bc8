use std::sync::Arc;

use thermo_core::health::HealthCheck;

use crate::middleware::request_stats::RequestStats;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: thermo_db::DbPool,
    /// Device whose measurements this instance owns.
    pub device_id: Arc<str>,
    /// Liveness check, the same one the registry heartbeat reports.
    pub health: Arc<dyn HealthCheck>,
    /// Uptime and request counter reported by `/health`.
    pub stats: Arc<RequestStats>,
}

impl AppState {
    pub fn new(
        pool: thermo_db::DbPool,
        device_id: impl Into<Arc<str>>,
        health: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            pool,
            device_id: device_id.into(),
            health,
            stats: Arc::new(RequestStats::new()),
        }
    }
}
