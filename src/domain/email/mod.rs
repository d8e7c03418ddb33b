//! Transactional email domain.

mod failed;
mod message;

pub use failed::{EmailMetadata, FailedEmailRecord, FailedEmailStatus};
pub use message::{EmailMessage, EmailType};
