use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thermo_core::duration::{parse_duration, DurationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TtlError {
    #[error(transparent)]
    Malformed(#[from] DurationError),

    #[error("TTL '{0}' is too short to derive a heartbeat period")]
    TooShort(String),
}

/// Time-to-live of the registry health check.
///
/// The configured string is what the registry receives; the heartbeat
/// cadence comes from the parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ttl {
    raw: String,
    duration: Duration,
}

impl Ttl {
    pub fn parse(raw: &str) -> Result<Self, TtlError> {
        let duration = parse_duration(raw)?;
        if (duration / 2).is_zero() {
            return Err(TtlError::TooShort(raw.to_string()));
        }
        Ok(Self {
            raw: raw.trim().to_string(),
            duration,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_duration(&self) -> Duration {
        self.duration
    }

    /// Interval between heartbeats: half the TTL.
    pub fn heartbeat_period(&self) -> Duration {
        self.duration / 2
    }
}

impl FromStr for Ttl {
    type Err = TtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
