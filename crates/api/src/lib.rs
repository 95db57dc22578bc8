//! Temperature service HTTP server library.
//!
//! Exposes configuration, state, error handling, routes and background jobs
//! so integration tests and the binary entrypoint can both access them.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
