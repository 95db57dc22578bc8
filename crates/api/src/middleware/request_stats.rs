//! Process uptime and API request counting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

#[derive(Debug)]
pub struct RequestStats {
    started_at: Instant,
    api_requests: AtomicU64,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            api_requests: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.api_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn api_requests(&self) -> u64 {
        self.api_requests.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Count every request that reaches the router, whatever its outcome.
pub async fn count_requests(
    State(stats): State<Arc<RequestStats>>,
    request: Request,
    next: Next,
) -> Response {
    stats.record_request();
    next.run(request).await
}
