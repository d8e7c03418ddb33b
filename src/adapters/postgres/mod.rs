//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresOrderStore` - Orders with the conditional terminal write
//! - `PostgresUserStore` - User profiles
//! - `PostgresSetupTokenStore` - One-time setup tokens
//! - `PostgresFailedEmailStore` - Dead letters for undeliverable email

mod failed_email_store;
mod order_store;
mod setup_token_store;
mod user_store;

pub use failed_email_store::PostgresFailedEmailStore;
pub use order_store::PostgresOrderStore;
pub use setup_token_store::PostgresSetupTokenStore;
pub use user_store::PostgresUserStore;
