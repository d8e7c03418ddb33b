//! SetupTokenManager - issue, verify, consume and clean up account setup
//! tokens.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::setup_token::{SetupToken, TokenInvalidReason};
use crate::ports::{CleanupCounts, SetupTokenStore};

#[derive(Debug, Error)]
pub enum SetupTokenError {
    #[error("setup token is invalid: {0}")]
    Invalid(TokenInvalidReason),

    #[error(transparent)]
    Storage(#[from] DomainError),
}

impl SetupTokenError {
    pub fn invalid_reason(&self) -> Option<TokenInvalidReason> {
        match self {
            SetupTokenError::Invalid(reason) => Some(*reason),
            SetupTokenError::Storage(_) => None,
        }
    }
}

pub struct SetupTokenManager {
    store: Arc<dyn SetupTokenStore>,
    ttl_hours: i64,
}

impl SetupTokenManager {
    pub fn new(store: Arc<dyn SetupTokenStore>, ttl_hours: i64) -> Self {
        Self { store, ttl_hours }
    }

    pub fn ttl_hours(&self) -> i64 {
        self.ttl_hours
    }

    /// Issues and stores a fresh token for `user_id`.
    pub async fn create(&self, user_id: UserId, email: &str) -> Result<SetupToken, DomainError> {
        let token = SetupToken::issue(user_id, email, self.ttl_hours, Timestamp::now());
        self.store.insert(&token).await?;
        tracing::info!(user_id = %user_id, expires_at = ?token.expires_at, "setup token issued");
        Ok(token)
    }

    /// Read-only validity check.
    pub async fn verify(&self, token: &str) -> Result<SetupToken, SetupTokenError> {
        let record = self
            .store
            .find(token)
            .await?
            .ok_or(SetupTokenError::Invalid(TokenInvalidReason::NotFound))?;
        record
            .check(Timestamp::now())
            .map_err(SetupTokenError::Invalid)?;
        Ok(record)
    }

    /// One-shot consumption. The losing side of a race sees `already_used`.
    /// Every other outstanding token for the same user is invalidated.
    pub async fn consume(&self, token: &str) -> Result<SetupToken, SetupTokenError> {
        let mut record = self.verify(token).await?;
        let now = Timestamp::now();

        if !self.store.mark_used_if_unused(token, now).await? {
            let reason = if record.expires_at.is_after(&now) {
                TokenInvalidReason::AlreadyUsed
            } else {
                TokenInvalidReason::Expired
            };
            return Err(SetupTokenError::Invalid(reason));
        }
        record.used = true;
        record.used_at = Some(now);

        let invalidated = self.invalidate_outstanding(&record.user_id, Some(token)).await?;
        tracing::info!(
            user_id = %record.user_id,
            invalidated,
            "setup token consumed"
        );
        Ok(record)
    }

    /// Marks every unused token of `user_id` except `except` as used.
    pub async fn invalidate_outstanding(
        &self,
        user_id: &UserId,
        except: Option<&str>,
    ) -> Result<u64, DomainError> {
        self.store
            .invalidate_for_user(user_id, except, Timestamp::now())
            .await
    }

    /// Deletes tokens expired or used more than `retention_days` ago.
    pub async fn cleanup(&self, retention_days: i64) -> Result<CleanupCounts, DomainError> {
        let cutoff = Timestamp::now().minus_days(retention_days);
        let counts = self.store.delete_stale(cutoff).await?;
        if counts.total() > 0 {
            tracing::info!(
                expired = counts.expired,
                used = counts.used,
                "setup token cleanup removed rows"
            );
        }
        Ok(counts)
    }
}
