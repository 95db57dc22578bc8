use axum::routing::get;
use axum::Router;

use crate::handlers::measurement;
use crate::state::AppState;

/// Routes mounted at `/measurements`.
///
/// ```text
/// GET  /        -> list_measurements
/// POST /        -> create_measurement
/// GET  /{id}    -> get_measurement
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(measurement::list_measurements).post(measurement::create_measurement),
        )
        .route("/{id}", get(measurement::get_measurement))
}
