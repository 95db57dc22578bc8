//! Periodic cleanup of old measurements.
//!
//! Deletes this device's rows older than the configured maximum age, on a
//! fixed interval driven by `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use thermo_core::types::Timestamp;
use thermo_db::repositories::MeasurementRepo;
use tokio_util::sync::CancellationToken;

/// `now - max_age`, or `None` when that falls outside the representable
/// timestamp range.
pub fn cutoff(now: Timestamp, max_age: Duration) -> Option<Timestamp> {
    let max_age = chrono::Duration::from_std(max_age).ok()?;
    now.checked_sub_signed(max_age)
}

/// Run the retention loop until `cancel` is triggered.
///
/// The first purge happens immediately. A `max_age` too large to subtract
/// from the current time stops the job.
pub async fn run(
    pool: PgPool,
    device_id: Arc<str>,
    max_age: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        max_age_secs = max_age.as_secs(),
        interval_secs = interval.as_secs(),
        "Retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                let Some(cutoff) = cutoff(Utc::now(), max_age) else {
                    tracing::error!(
                        max_age_secs = max_age.as_secs(),
                        "Retention: max age out of range, job stopping"
                    );
                    break;
                };
                match MeasurementRepo::delete_older_than(&pool, &device_id, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Retention: purged old measurements");
                        } else {
                            tracing::debug!("Retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Retention: cleanup failed");
                    }
                }
            }
        }
    }
}
