//! Temperature sampling.
//!
//! [`sensor`] reads a sensor, [`sampler`] turns it into a stream of
//! readings on an `mpsc` channel for a single consumer to persist.

pub mod config;
pub mod sampler;
pub mod sensor;

pub use config::SensorConfig;
pub use sensor::{Reading, SensorError, TemperatureSensor, W1ThermSensor};
