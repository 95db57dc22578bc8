use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use thermo_core::health::HealthCheck;
use thermo_db::DbHealthCheck;
use tower::ServiceExt;

use thermo_api::config::ServerConfig;
use thermo_api::router::build_app_router;
use thermo_api::state::AppState;

/// Device id every test app is configured with.
pub const TEST_DEVICE_ID: &str = "b8:27:eb:00:00:01";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: Some(0),
        request_timeout_secs: 30,
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// with the database health check.
pub fn build_test_app(pool: PgPool) -> Router {
    let health: Arc<dyn HealthCheck> = Arc::new(DbHealthCheck::new(pool.clone()));
    build_test_app_with_health(pool, health)
}

pub fn build_test_app_with_health(pool: PgPool, health: Arc<dyn HealthCheck>) -> Router {
    let state = AppState::new(pool, TEST_DEVICE_ID, health);
    build_app_router(state, &test_config())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
