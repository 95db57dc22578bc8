//! Persists sensor readings (the consumer side of the reading channel).

use std::sync::Arc;

use sqlx::PgPool;
use thermo_db::models::measurement::CreateMeasurement;
use thermo_db::repositories::MeasurementRepo;
use thermo_sensor::Reading;
use tokio::sync::mpsc;

/// Insert every reading received on `rx` for `device_id`.
///
/// Failed inserts are logged and the reading is dropped. Returns once the
/// channel is closed and drained, with the number of stored readings.
pub async fn run(pool: PgPool, device_id: Arc<str>, mut rx: mpsc::Receiver<Reading>) -> u64 {
    tracing::info!(device_id = %device_id, "Ingest consumer started");

    let mut stored = 0u64;
    while let Some(reading) = rx.recv().await {
        let input = CreateMeasurement {
            value: reading.value,
            unit: reading.unit,
        };
        match MeasurementRepo::insert(&pool, &device_id, &input).await {
            Ok(_) => stored += 1,
            Err(e) => {
                tracing::error!(error = %e, value = input.value, "Ingest: failed to store reading");
            }
        }
    }

    tracing::info!(stored, "Ingest consumer finished");
    stored
}
