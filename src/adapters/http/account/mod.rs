//! HTTP adapter for account setup endpoints.
//!
//! - `GET /api/account/setup?token=` - Check a setup link before showing the form
//! - `POST /api/account/setup` - Set a password and activate the account

pub mod dto;
mod handlers;
mod routes;

pub use dto::*;
pub use handlers::{complete_setup, verify_setup_token};
pub use routes::account_routes;
