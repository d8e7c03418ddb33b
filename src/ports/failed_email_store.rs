//! Failed email store port.

use crate::domain::email::FailedEmailRecord;
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Dead-letter storage for emails an operator needs to look at.
#[async_trait]
pub trait FailedEmailStore: Send + Sync {
    async fn insert(&self, record: &FailedEmailRecord) -> Result<(), DomainError>;
}
