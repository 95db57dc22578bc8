//! Measurement entity and insert DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thermo_core::types::{DbId, Timestamp};
use validator::{Validate, ValidationError};

/// A single stored sensor reading.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Measurement {
    pub id: DbId,
    pub value: f32,
    pub unit: String,
    /// Device that produced the reading.
    pub instance_id: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a measurement.
///
/// The device id is not part of the payload; the store always tags rows
/// with its configured device.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMeasurement {
    #[validate(custom(function = "validate_finite"))]
    pub value: f32,
    #[validate(length(min = 1, max = 32))]
    pub unit: String,
}

fn validate_finite(value: f32) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("not_finite"))
    }
}
