//! In-memory store adapters.
//!
//! Back the tests and local development when no database URL is
//! configured. Data does not survive a restart.

mod failed_email_store;
mod order_store;
mod setup_token_store;
mod user_store;

pub use failed_email_store::InMemoryFailedEmailStore;
pub use order_store::InMemoryOrderStore;
pub use setup_token_store::InMemorySetupTokenStore;
pub use user_store::InMemoryUserStore;
