//! CompleteAccountSetupHandler - sets the first password for a provisioned
//! account and activates it.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::application::services::{SetupTokenError, SetupTokenManager};
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::setup_token::TokenInvalidReason;
use crate::domain::user::{AccountStatus, User};
use crate::ports::{IdentityError, IdentityStore, UserStore};

/// Command to finish account setup.
#[derive(Debug, Clone)]
pub struct CompleteAccountSetupCommand {
    pub token: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteAccountSetupResult {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AccountSetupError {
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("setup token is invalid: {0}")]
    InvalidToken(TokenInvalidReason),

    #[error("could not update credentials: {0}")]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Storage(#[from] DomainError),
}

impl From<SetupTokenError> for AccountSetupError {
    fn from(err: SetupTokenError) -> Self {
        match err {
            SetupTokenError::Invalid(reason) => AccountSetupError::InvalidToken(reason),
            SetupTokenError::Storage(err) => AccountSetupError::Storage(err),
        }
    }
}

pub struct CompleteAccountSetupHandler {
    tokens: Arc<SetupTokenManager>,
    identities: Arc<dyn IdentityStore>,
    users: Arc<dyn UserStore>,
    min_password_len: usize,
}

impl CompleteAccountSetupHandler {
    pub fn new(
        tokens: Arc<SetupTokenManager>,
        identities: Arc<dyn IdentityStore>,
        users: Arc<dyn UserStore>,
        min_password_len: usize,
    ) -> Self {
        Self {
            tokens,
            identities,
            users,
            min_password_len,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteAccountSetupCommand,
    ) -> Result<CompleteAccountSetupResult, AccountSetupError> {
        if cmd.password.expose_secret().chars().count() < self.min_password_len {
            return Err(AccountSetupError::PasswordTooShort {
                min: self.min_password_len,
            });
        }

        let token = cmd.token.trim();
        let record = self.tokens.verify(token).await?;

        self.identities
            .update_password(&record.user_id, &cmd.password)
            .await?;
        self.tokens.consume(token).await?;

        let mut user = match self.users.find_by_id(&record.user_id).await? {
            Some(user) => user,
            None => User::new(record.user_id, &record.email, AccountStatus::PendingSetup)
                .map_err(DomainError::from)?,
        };
        user.activate().map_err(DomainError::from)?;
        self.users.upsert(&user).await?;

        tracing::info!(user_id = %user.id, "account setup completed");
        Ok(CompleteAccountSetupResult {
            user_id: user.id,
            email: user.email,
        })
    }
}
