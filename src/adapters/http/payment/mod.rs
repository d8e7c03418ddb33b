//! HTTP adapter for payment endpoints.
//!
//! - `POST /api/payments/checkout` - Create a pending order and encrypt the gateway request
//! - `POST /api/payments/callback` - Gateway completion callback (always redirects)
//! - `POST /api/payments/cancel` - Gateway cancel callback (always redirects)

pub mod dto;
mod handlers;
mod routes;

pub use dto::*;
pub use handlers::{handle_callback, initiate_checkout};
pub use routes::payment_routes;
