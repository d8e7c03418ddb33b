//! Axum router configuration for account setup endpoints.

use axum::routing::get;
use axum::Router;

use super::handlers::{complete_setup, verify_setup_token};
use crate::adapters::http::AppState;

/// Account routes, mounted at `/api/account`.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/setup", get(verify_setup_token).post(complete_setup))
}
