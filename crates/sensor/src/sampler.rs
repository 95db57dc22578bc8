//! Periodic sampling loop (the producer side of the reading channel).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::sensor::{Reading, TemperatureSensor};

/// Capacity of the reading channel between sampler and consumer.
pub const CHANNEL_CAPACITY: usize = 64;

/// Create the reading channel.
pub fn channel() -> (mpsc::Sender<Reading>, mpsc::Receiver<Reading>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Sample `sensor` every `interval` and push readings into `tx`.
///
/// The first sample is taken immediately. Failed reads are logged and
/// skipped. Runs until `cancel` fires or the receiver is dropped; dropping
/// `tx` on exit lets the consumer drain and finish.
pub async fn run(
    sensor: Arc<dyn TemperatureSensor>,
    interval: Duration,
    tx: mpsc::Sender<Reading>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_ms = interval.as_millis() as u64, "Sampler started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Sampler stopping");
                break;
            }
            _ = ticker.tick() => {
                match sensor.read().await {
                    Ok(reading) => {
                        tracing::debug!(value = reading.value, unit = %reading.unit, "Sampled sensor");
                        if tx.send(reading).await.is_err() {
                            tracing::warn!("Reading consumer closed, sampler stopping");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Sensor read failed, skipping sample");
                    }
                }
            }
        }
    }
}
