pub mod health;
pub mod measurement;

use axum::Router;

use crate::state::AppState;

/// Build the resource route tree.
///
/// ```text
/// /measurements          list, create
/// /measurements/{id}     get
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/measurements", measurement::router())
}
