//! Integration tests for the sampling loop and the sysfs-backed sensor.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thermo_sensor::sampler;
use thermo_sensor::sensor::CELSIUS;
use thermo_sensor::{Reading, SensorError, TemperatureSensor, W1ThermSensor};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Replays a scripted sequence of results, then keeps returning 20.0.
struct ScriptedSensor {
    script: Mutex<VecDeque<Result<f32, ()>>>,
}

impl ScriptedSensor {
    fn new(script: Vec<Result<f32, ()>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl TemperatureSensor for ScriptedSensor {
    async fn read(&self) -> Result<Reading, SensorError> {
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(20.0));
        match next {
            Ok(value) => Ok(Reading {
                value,
                unit: CELSIUS.to_string(),
            }),
            Err(()) => Err(SensorError::CrcMismatch),
        }
    }
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn samples_immediately_then_every_interval() {
    let sensor = Arc::new(ScriptedSensor::new(vec![Ok(18.5), Ok(19.0), Ok(19.5)]));
    let (tx, mut rx) = sampler::channel();
    let cancel = CancellationToken::new();

    let task = tokio::spawn(sampler::run(
        sensor,
        Duration::from_secs(30),
        tx,
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_secs(61)).await;
    cancel.cancel();
    task.await.unwrap();

    let mut values = Vec::new();
    while let Some(reading) = rx.recv().await {
        values.push(reading.value);
    }
    assert_eq!(values, vec![18.5, 19.0, 19.5]);
}

#[tokio::test(start_paused = true)]
async fn failed_reads_are_skipped() {
    let sensor = Arc::new(ScriptedSensor::new(vec![Ok(18.0), Err(()), Ok(21.0)]));
    let (tx, mut rx) = sampler::channel();
    let cancel = CancellationToken::new();

    let task = tokio::spawn(sampler::run(
        sensor,
        Duration::from_secs(10),
        tx,
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_secs(25)).await;
    cancel.cancel();
    task.await.unwrap();

    let mut values = Vec::new();
    while let Some(reading) = rx.recv().await {
        values.push(reading.value);
    }
    assert_eq!(values, vec![18.0, 21.0]);
}

#[tokio::test(start_paused = true)]
async fn stops_when_consumer_goes_away() {
    let sensor = Arc::new(ScriptedSensor::new(Vec::new()));
    let (tx, rx) = sampler::channel();
    drop(rx);

    // Completes on its own; no cancellation needed.
    sampler::run(sensor, Duration::from_secs(1), tx, CancellationToken::new()).await;
}

// ---------------------------------------------------------------------------
// W1ThermSensor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn w1_sensor_reads_sysfs_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES").unwrap();
    writeln!(file, "72 01 4b 46 7f ff 0e 10 57 t=21500").unwrap();

    let sensor = W1ThermSensor::new(file.path());
    let reading = sensor.read().await.unwrap();

    assert_eq!(
        reading,
        Reading {
            value: 21.5,
            unit: "°C".to_string()
        }
    );
}

#[tokio::test]
async fn w1_sensor_reports_missing_device() {
    let dir = tempfile::tempdir().unwrap();
    let sensor = W1ThermSensor::new(dir.path().join("28-missing").join("w1_slave"));

    let err = sensor.read().await.unwrap_err();
    assert!(matches!(err, SensorError::Io { .. }));
    assert!(err.to_string().contains("28-missing"));
}
