use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thermo_core::duration::{parse_duration, DurationError};

fn default_enabled() -> bool {
    true
}

fn default_interval() -> String {
    "30s".to_string()
}

/// The `sensor` section of the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SensorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Path of the sensor's `w1_slave` file.
    pub device_path: PathBuf,
    /// Sampling interval in duration syntax.
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl SensorConfig {
    pub fn interval(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.interval)
    }
}
