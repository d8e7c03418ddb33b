//! User profile store port.

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::User;
use async_trait::async_trait;

/// Persistence for application user profiles.
///
/// Emails are stored normalized (trimmed, lowercase) and are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a profile by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Find a profile by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Insert or fully replace the profile keyed by `user.id`.
    async fn upsert(&self, user: &User) -> Result<(), DomainError>;
}
