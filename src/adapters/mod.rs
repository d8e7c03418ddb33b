//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-memory stores for tests and local development
//! - `postgres` - sqlx stores
//! - `identity` - Supabase GoTrue admin API
//! - `email` - Resend
//! - `analytics` - Meta Conversions API
//! - `http` - axum router and handlers

pub mod analytics;
pub mod email;
pub mod http;
pub mod identity;
pub mod memory;
pub mod postgres;
