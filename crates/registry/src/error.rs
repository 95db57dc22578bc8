use crate::ttl::TtlError;

/// Errors raised while talking to, or configuring access to, the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry could not be reached (connect failure, timeout, ...).
    #[error("Registry unreachable: {0}")]
    Unreachable(String),

    /// The registry answered with a non-success status.
    #[error("Registry rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid TTL: {0}")]
    InvalidTtl(#[from] TtlError),

    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),

    #[error("Heartbeat is already running for this registration")]
    HeartbeatAlreadyRunning,
}
