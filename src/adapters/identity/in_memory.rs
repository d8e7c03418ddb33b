//! In-memory IdentityStore for tests and local development.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{Identity, IdentityError, IdentityStore};

struct StoredIdentity {
    identity: Identity,
    password: String,
}

/// Identities in creation order, so paging is stable.
///
/// By default it has no indexed email lookup, like the hosted backend.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<Vec<StoredIdentity>>,
    indexed_lookup: bool,
    hidden_emails: HashSet<String>,
    create_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `find_by_email`.
    pub fn with_indexed_lookup(mut self) -> Self {
        self.indexed_lookup = true;
        self
    }

    /// Makes `email` conflict on create while never appearing in lookups
    /// or listings.
    pub fn with_hidden_email(mut self, email: &str) -> Self {
        self.hidden_emails.insert(email.trim().to_lowercase());
        self
    }

    /// Adds an identity directly, as if created by an earlier run.
    pub async fn seed(&self, email: &str) -> Identity {
        let identity = Identity {
            id: UserId::new(),
            email: email.trim().to_lowercase(),
        };
        self.identities.write().await.push(StoredIdentity {
            identity: identity.clone(),
            password: String::new(),
        });
        identity
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub async fn password_for(&self, id: &UserId) -> Option<SecretString> {
        self.identities
            .read()
            .await
            .iter()
            .find(|stored| &stored.identity.id == id)
            .map(|stored| SecretString::new(stored.password.clone()))
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, IdentityError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let email = email.trim().to_lowercase();
        if self.hidden_emails.contains(&email) {
            return Err(IdentityError::EmailExists);
        }

        let mut identities = self.identities.write().await;
        if identities.iter().any(|stored| stored.identity.email == email) {
            return Err(IdentityError::EmailExists);
        }
        let identity = Identity {
            id: UserId::new(),
            email,
        };
        identities.push(StoredIdentity {
            identity: identity.clone(),
            password: password.expose_secret().clone(),
        });
        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError> {
        if !self.indexed_lookup {
            return Err(IdentityError::Unsupported);
        }
        let email = email.trim().to_lowercase();
        Ok(self
            .identities
            .read()
            .await
            .iter()
            .find(|stored| stored.identity.email == email)
            .map(|stored| stored.identity.clone()))
    }

    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<Identity>, IdentityError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let skip = page.saturating_sub(1) as usize * per_page as usize;
        Ok(self
            .identities
            .read()
            .await
            .iter()
            .skip(skip)
            .take(per_page as usize)
            .map(|stored| stored.identity.clone())
            .collect())
    }

    async fn update_password(
        &self,
        id: &UserId,
        password: &SecretString,
    ) -> Result<(), IdentityError> {
        let mut identities = self.identities.write().await;
        let stored = identities
            .iter_mut()
            .find(|stored| &stored.identity.id == id)
            .ok_or(IdentityError::NotFound)?;
        stored.password = password.expose_secret().clone();
        Ok(())
    }
}
