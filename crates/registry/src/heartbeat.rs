//! Periodic TTL reporting.
//!
//! Every tick runs the health check once and delivers exactly one pass or
//! fail report. Ticks never overlap: a slow report delays the next tick
//! instead of queueing extra ones. Delivery failures are logged and left to
//! the next tick; the registry's own TTL expiry is the backstop.

use std::sync::Arc;
use std::time::Duration;

use thermo_core::health::{HealthCheck, HealthStatus};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::registry::ServiceRegistry;

/// Reason reported when a check fails without saying why.
const UNSPECIFIED_FAILURE: &str = "health check failed";

/// A running heartbeat loop.
///
/// Dropping the task cancels the loop; [`HeartbeatTask::stop`] additionally
/// waits for an in-flight report to finish.
pub struct HeartbeatTask {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatTask {
    /// Spawn the loop on the current tokio runtime.
    ///
    /// The first report is sent one `period` after spawning.
    pub fn spawn(
        registry: Arc<dyn ServiceRegistry>,
        check_id: String,
        period: Duration,
        check: Arc<dyn HealthCheck>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(registry, check_id, period, check, cancel.clone()));
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Heartbeat task ended abnormally");
            }
        }
    }
}

impl Drop for HeartbeatTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drive the heartbeat until `cancel` fires.
pub async fn run(
    registry: Arc<dyn ServiceRegistry>,
    check_id: String,
    period: Duration,
    check: Arc<dyn HealthCheck>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        check_id = %check_id,
        period_ms = period.as_millis() as u64,
        "Heartbeat started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                beat(registry.as_ref(), &check_id, check.as_ref()).await;
            }
        }
    }

    tracing::info!(check_id = %check_id, "Heartbeat stopped");
}

/// One heartbeat: check, then report the outcome.
///
/// Returns the check result so callers can observe what was reported.
pub async fn beat(
    registry: &dyn ServiceRegistry,
    check_id: &str,
    check: &dyn HealthCheck,
) -> HealthStatus {
    let status = check.check().await;

    let delivery = if status.healthy {
        registry.pass_ttl(check_id, "").await
    } else {
        let reason = status.reason.as_deref().unwrap_or(UNSPECIFIED_FAILURE);
        tracing::warn!(check_id, reason, "Service check not OK");
        registry.fail_ttl(check_id, reason).await
    };

    match delivery {
        Ok(()) => tracing::debug!(check_id, healthy = status.healthy, "Heartbeat delivered"),
        Err(e) => tracing::warn!(
            check_id,
            healthy = status.healthy,
            error = %e,
            "Failed to notify registry"
        ),
    }

    status
}
