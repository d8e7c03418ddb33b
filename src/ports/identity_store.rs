//! Identity store port (credentials and email confirmation).
//!
//! Backed by a hosted auth service. Not every backend offers an indexed
//! email lookup, so `find_by_email` has a default that reports
//! `Unsupported` and callers fall back to a bounded scan of `list_users`.

use crate::domain::foundation::UserId;
use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

/// An identity as known to the auth backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
}

/// Errors from the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("an identity with this email already exists")]
    EmailExists,

    #[error("identity not found")]
    NotFound,

    #[error("operation not supported by this identity backend")]
    Unsupported,

    #[error("identity backend rejected the request: {0}")]
    Rejected(String),

    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
}

/// Port for the identity backend.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an identity with an already-confirmed email.
    ///
    /// # Errors
    ///
    /// - `EmailExists` if the email is taken
    async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, IdentityError>;

    /// Indexed lookup by email, where the backend has one.
    async fn find_by_email(&self, _email: &str) -> Result<Option<Identity>, IdentityError> {
        Err(IdentityError::Unsupported)
    }

    /// One page of identities. `page` starts at 1.
    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<Identity>, IdentityError>;

    /// Replace the identity's password.
    async fn update_password(
        &self,
        id: &UserId,
        password: &SecretString,
    ) -> Result<(), IdentityError>;
}
