//! Service-registry integration: registration, TTL heartbeat, deregistration.
//!
//! Lifecycle of a process:
//!
//! ```text
//! Unregistered --register()--> Registered --start_heartbeat()--> Registered + ticking
//!                                   |                                     |
//!                                   +------------deregister()-------------+--> Deregistered
//! ```
//!
//! A [`RegistrationHandle`] only exists once the registry accepted the
//! service, and `deregister` consumes it, so the heartbeat can never run
//! for an unregistered service and a service cannot be deregistered twice.

pub mod config;
pub mod consul;
pub mod error;
pub mod heartbeat;
pub mod registration;
pub mod registry;
pub mod ttl;

pub use config::RegistryConfig;
pub use consul::ConsulRegistry;
pub use error::RegistryError;
pub use registration::RegistrationHandle;
pub use registry::{ServiceRegistration, ServiceRegistry};
pub use ttl::Ttl;
