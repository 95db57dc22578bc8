//! Repository for the `measurements` table (append-only).

use sqlx::PgPool;
use thermo_core::types::{DbId, Timestamp};

use crate::models::measurement::{CreateMeasurement, Measurement};

/// Column list for `measurements` SELECT queries.
const COLUMNS: &str = "id, value, unit, instance_id, created_at";

/// Provides query operations for measurements.
pub struct MeasurementRepo;

impl MeasurementRepo {
    /// Insert a measurement tagged with `device_id`.
    pub async fn insert(
        pool: &PgPool,
        device_id: &str,
        input: &CreateMeasurement,
    ) -> Result<Measurement, sqlx::Error> {
        tracing::debug!(value = input.value, unit = %input.unit, "Inserting measurement");

        let query = format!(
            "INSERT INTO measurements (value, unit, instance_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let measurement = sqlx::query_as::<_, Measurement>(&query)
            .bind(input.value)
            .bind(&input.unit)
            .bind(device_id)
            .fetch_one(pool)
            .await?;

        tracing::info!(measurement_id = measurement.id, "Measurement inserted");
        Ok(measurement)
    }

    /// Find a measurement by its id, regardless of device.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Measurement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM measurements WHERE id = $1");
        sqlx::query_as::<_, Measurement>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List measurements for a device, newest first.
    pub async fn list_for_device(
        pool: &PgPool,
        device_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Measurement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM measurements \
             WHERE instance_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Measurement>(&query)
            .bind(device_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Delete a device's measurements older than `cutoff`.
    ///
    /// Returns the number of rows deleted.
    pub async fn delete_older_than(
        pool: &PgPool,
        device_id: &str,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM measurements WHERE instance_id = $1 AND created_at < $2")
                .bind(device_id)
                .bind(cutoff)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
