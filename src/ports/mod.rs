//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `OrderStore` - Orders, including the conditional terminal write
//! - `UserStore` - Application user profiles
//! - `SetupTokenStore` - One-time account setup tokens
//! - `FailedEmailStore` - Dead letters for undeliverable email
//!
//! ## External Service Ports
//!
//! - `IdentityStore` - Hosted auth backend (credentials)
//! - `EmailProvider` - Transactional email API
//! - `AnalyticsProvider` - Conversions API

mod analytics_provider;
mod email_provider;
mod failed_email_store;
mod identity_store;
mod order_store;
mod setup_token_store;
mod user_store;

pub use analytics_provider::{AnalyticsError, AnalyticsProvider};
pub use email_provider::{EmailDeliveryError, EmailProvider, EmailReceipt};
pub use failed_email_store::FailedEmailStore;
pub use identity_store::{Identity, IdentityError, IdentityStore};
pub use order_store::OrderStore;
pub use setup_token_store::{CleanupCounts, SetupTokenStore};
pub use user_store::UserStore;
