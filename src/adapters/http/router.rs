//! Application router.

use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::account::account_routes;
use super::payment::payment_routes;
use super::AppState;

/// Builds the complete router.
///
/// # Routes
/// - `GET /health`
/// - `/api/payments/*` - see [`payment_routes`]
/// - `/api/account/*` - see [`account_routes`]
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/payments", payment_routes())
        .nest("/api/account", account_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
