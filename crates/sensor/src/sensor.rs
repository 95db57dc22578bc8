//! DS18B20 1-Wire temperature sensor.
//!
//! The kernel `w1_therm` driver exposes each sensor as a `w1_slave` file:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! The first line must end in `YES` (CRC ok); the second carries the
//! temperature in thousandths of a degree Celsius.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

/// Unit reported by [`W1ThermSensor`].
pub const CELSIUS: &str = "°C";

/// A single sample taken from a sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub value: f32,
    pub unit: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("cannot read sensor at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sensor reported a CRC mismatch")]
    CrcMismatch,

    #[error("malformed sensor output: {0}")]
    Malformed(String),
}

/// Anything that can produce a temperature reading.
#[async_trait]
pub trait TemperatureSensor: Send + Sync {
    async fn read(&self) -> Result<Reading, SensorError>;
}

/// Reads a DS18B20 sensor through its sysfs `w1_slave` file.
#[derive(Debug, Clone)]
pub struct W1ThermSensor {
    path: PathBuf,
}

impl W1ThermSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TemperatureSensor for W1ThermSensor {
    async fn read(&self) -> Result<Reading, SensorError> {
        // Reading the file triggers a conversion on the sensor (~750 ms).
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| SensorError::Io {
                    path: self.path.clone(),
                    source,
                })?;

        Ok(Reading {
            value: parse_w1_slave(&contents)?,
            unit: CELSIUS.to_string(),
        })
    }
}

/// Parse `w1_slave` contents into degrees Celsius.
pub fn parse_w1_slave(contents: &str) -> Result<f32, SensorError> {
    let mut lines = contents.lines();

    let crc_line = lines
        .next()
        .ok_or_else(|| SensorError::Malformed("empty output".into()))?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(SensorError::CrcMismatch);
    }

    let data_line = lines
        .next()
        .ok_or_else(|| SensorError::Malformed("missing temperature line".into()))?;
    let (_, raw) = data_line
        .rsplit_once("t=")
        .ok_or_else(|| SensorError::Malformed("missing t= field".into()))?;

    let millidegrees: i32 = raw
        .trim()
        .parse()
        .map_err(|_| SensorError::Malformed(format!("invalid temperature '{}'", raw.trim())))?;

    Ok(millidegrees as f32 / 1000.0)
}
