//! In-memory SetupTokenStore.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::setup_token::SetupToken;
use crate::ports::{CleanupCounts, SetupTokenStore};

#[derive(Default)]
pub struct InMemorySetupTokenStore {
    tokens: RwLock<HashMap<String, SetupToken>>,
}

impl InMemorySetupTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every token ever issued to `user_id`, oldest first.
    pub async fn tokens_for(&self, user_id: &UserId) -> Vec<SetupToken> {
        let mut tokens: Vec<_> = self
            .tokens
            .read()
            .await
            .values()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.created_at);
        tokens
    }
}

#[async_trait]
impl SetupTokenStore for InMemorySetupTokenStore {
    async fn insert(&self, token: &SetupToken) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token) {
            return Err(DomainError::new(ErrorCode::Conflict, "setup token already exists"));
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<SetupToken>, DomainError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn mark_used_if_unused(
        &self,
        token: &str,
        used_at: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token) {
            Some(record) if !record.used && record.expires_at.is_after(&used_at) => {
                record.used = true;
                record.used_at = Some(used_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invalidate_for_user(
        &self,
        user_id: &UserId,
        except: Option<&str>,
        used_at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut tokens = self.tokens.write().await;
        let mut invalidated = 0;
        for record in tokens.values_mut() {
            if &record.user_id == user_id && !record.used && Some(record.token.as_str()) != except {
                record.used = true;
                record.used_at = Some(used_at);
                invalidated += 1;
            }
        }
        Ok(invalidated)
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> Result<CleanupCounts, DomainError> {
        let mut tokens = self.tokens.write().await;
        let mut counts = CleanupCounts::default();
        tokens.retain(|_, record| {
            if record.used {
                if record.used_at.unwrap_or(record.created_at).is_before(&cutoff) {
                    counts.used += 1;
                    return false;
                }
            } else if record.expires_at.is_before(&cutoff) {
                counts.expired += 1;
                return false;
            }
            true
        });
        Ok(counts)
    }
}
