//! In-memory FailedEmailStore.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::email::FailedEmailRecord;
use crate::domain::foundation::DomainError;
use crate::ports::FailedEmailStore;

#[derive(Default)]
pub struct InMemoryFailedEmailStore {
    records: RwLock<Vec<FailedEmailRecord>>,
}

impl InMemoryFailedEmailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded failures in insertion order.
    pub async fn records(&self) -> Vec<FailedEmailRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl FailedEmailStore for InMemoryFailedEmailStore {
    async fn insert(&self, record: &FailedEmailRecord) -> Result<(), DomainError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
