//! Email provider adapters.
//!
//! - `ResendEmailProvider` - Resend HTTP API
//! - `MockEmailProvider` - scripted failures and a sent log for tests

mod mock;
mod resend;

pub use mock::MockEmailProvider;
pub use resend::ResendEmailProvider;
