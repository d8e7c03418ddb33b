//! HTTP adapters - REST API implementations.
//!
//! - `payment` - Gateway callback, cancel and checkout endpoints
//! - `account` - Setup token verification and account activation
//! - `router` - The assembled application router with tracing and timeouts

pub mod account;
mod error;
pub mod payment;
mod router;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use router::app_router;
pub use state::AppState;
