//! VerifySetupTokenHandler - read-only check behind the setup page.

use std::sync::Arc;

use crate::application::services::{SetupTokenError, SetupTokenManager};
use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone)]
pub struct VerifySetupTokenQuery {
    pub token: String,
}

/// What the setup page may show for a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifySetupTokenResult {
    pub email: String,
    pub expires_at: Timestamp,
}

pub struct VerifySetupTokenHandler {
    tokens: Arc<SetupTokenManager>,
}

impl VerifySetupTokenHandler {
    pub fn new(tokens: Arc<SetupTokenManager>) -> Self {
        Self { tokens }
    }

    pub async fn handle(
        &self,
        query: VerifySetupTokenQuery,
    ) -> Result<VerifySetupTokenResult, SetupTokenError> {
        let record = self.tokens.verify(query.token.trim()).await?;
        Ok(VerifySetupTokenResult {
            email: record.email,
            expires_at: record.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySetupTokenStore;
    use crate::domain::foundation::UserId;
    use crate::domain::setup_token::TokenInvalidReason;

    #[tokio::test]
    async fn valid_token_returns_email() {
        let manager = Arc::new(SetupTokenManager::new(
            Arc::new(InMemorySetupTokenStore::new()),
            48,
        ));
        let token = manager.create(UserId::new(), "guest@example.com").await.unwrap();
        let handler = VerifySetupTokenHandler::new(manager);

        let result = handler
            .handle(VerifySetupTokenQuery {
                token: format!(" {} ", token.token),
            })
            .await
            .unwrap();
        assert_eq!(result.email, "guest@example.com");
        assert_eq!(result.expires_at, token.expires_at);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let handler = VerifySetupTokenHandler::new(Arc::new(SetupTokenManager::new(
            Arc::new(InMemorySetupTokenStore::new()),
            48,
        )));
        let err = handler
            .handle(VerifySetupTokenQuery {
                token: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.invalid_reason(), Some(TokenInvalidReason::NotFound));
    }
}
