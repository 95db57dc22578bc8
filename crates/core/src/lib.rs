//! Shared domain types for the thermo workspace.
//!
//! Kept free of I/O so every other crate (store, registry, sensor, API) can
//! depend on it without pulling in a runtime.

pub mod duration;
pub mod error;
pub mod health;
pub mod pagination;
pub mod types;
