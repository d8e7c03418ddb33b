//! Setup token store port.

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::setup_token::SetupToken;
use async_trait::async_trait;

/// Rows removed by a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupCounts {
    pub expired: u64,
    pub used: u64,
}

impl CleanupCounts {
    pub fn total(&self) -> u64 {
        self.expired + self.used
    }
}

/// Persistence for one-time setup tokens.
#[async_trait]
pub trait SetupTokenStore: Send + Sync {
    async fn insert(&self, token: &SetupToken) -> Result<(), DomainError>;

    /// Find a token by its value, used or not.
    async fn find(&self, token: &str) -> Result<Option<SetupToken>, DomainError>;

    /// Mark the token used if it is unused and unexpired as of `used_at`.
    ///
    /// Returns `true` only for the caller that flipped the flag. Must be a
    /// single conditional write.
    async fn mark_used_if_unused(&self, token: &str, used_at: Timestamp)
        -> Result<bool, DomainError>;

    /// Mark every other unused token of `user_id` as used. Returns the
    /// number of tokens invalidated.
    async fn invalidate_for_user(
        &self,
        user_id: &UserId,
        except: Option<&str>,
        used_at: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Delete unused tokens expired before `cutoff` and used tokens used
    /// before `cutoff`.
    async fn delete_stale(&self, cutoff: Timestamp) -> Result<CleanupCounts, DomainError>;
}
