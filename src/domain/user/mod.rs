//! User domain module.

mod aggregate;
mod status;

pub use aggregate::{normalize_email, User};
pub use status::{AccountStatus, SubscriptionStatus};
