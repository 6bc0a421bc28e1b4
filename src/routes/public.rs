use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that sit outside the access guard entirely.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer and monitoring probe.
        .route("/health", get(|| async { "ok" }))
}
