//! Axum router configuration for payment endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{handle_callback, initiate_checkout};
use crate::adapters::http::AppState;

/// Payment routes, mounted at `/api/payments`.
///
/// The gateway posts both completions and cancellations as the same
/// encrypted form, so both URLs share one handler.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(initiate_checkout))
        .route("/callback", post(handle_callback))
        .route("/cancel", post(handle_callback))
}
