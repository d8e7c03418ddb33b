//! In-memory UserStore.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::user::User;
use crate::ports::UserStore;

/// Profiles keyed by id, with email uniqueness enforced on upsert.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    fail_writes: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Makes `upsert` fail, for exercising storage error paths.
    pub async fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn upsert(&self, user: &User) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("user store unavailable"));
        }
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|other| other.email == user.email && other.id != user.id)
        {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                "email belongs to another user",
            ));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::AccountStatus;

    #[tokio::test]
    async fn lookup_by_email_ignores_case() {
        let store = InMemoryUserStore::new();
        let user = User::new(UserId::new(), "a@example.com", AccountStatus::Active).unwrap();
        store.upsert(&user).await.unwrap();

        let found = store.find_by_email(" A@Example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn upsert_replaces_same_id_and_rejects_email_clash() {
        let store = InMemoryUserStore::new();
        let mut user = User::new(UserId::new(), "a@example.com", AccountStatus::PendingSetup).unwrap();
        store.upsert(&user).await.unwrap();
        user.activate().unwrap();
        store.upsert(&user).await.unwrap();
        assert_eq!(store.len().await, 1);

        let clash = User::new(UserId::new(), "a@example.com", AccountStatus::Active).unwrap();
        assert_eq!(store.upsert(&clash).await.unwrap_err().code, ErrorCode::Conflict);
    }
}
