//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod measurement_repo;

pub use measurement_repo::MeasurementRepo;
