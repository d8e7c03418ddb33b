//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, state machine)
//! - `payment` - Gateway cipher, callback payload and redirects
//! - `order` - Order aggregate and plans
//! - `user` - User profile and entitlements
//! - `setup_token` - One-time account setup tokens
//! - `email` - Transactional email and failure records
//! - `analytics` - Purchase conversion events

pub mod analytics;
pub mod email;
pub mod foundation;
pub mod order;
pub mod payment;
pub mod setup_token;
pub mod user;
