//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, the lifecycle trait and the error vocabulary
//! used across the payment, order, user and email domains.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{FailedEmailId, OrderId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
