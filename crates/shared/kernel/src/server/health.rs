use axum::http::header;
use axum::{Json, response::IntoResponse};
use std::sync::LazyLock;
use std::time::Instant;
use wed_derive::{api_handler, api_model};
use wed_domain::constants::SYSTEM_TAG;

#[api_model]
/// Liveness report
pub struct HealthResponse {
    /// Always `up` while the process serves requests
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Seconds since startup
    pub uptime: u64,
}

static STARTED: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Touches the uptime clock so it measures from server start instead of the first probe.
pub fn mark_started() {
    LazyLock::force(&STARTED);
}

#[api_handler(
    get,
    path = "/health",
    responses((status = OK, description = "Service is up", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler() -> impl IntoResponse {
    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: STARTED.elapsed().as_secs(),
    };

    ([(header::CACHE_CONTROL, "no-store")], Json(body))
}
