//! GuestProvisioningService - ensure a paid order ends up with exactly one
//! entitled user.
//!
//! Spans the identity store and the profile store without a transaction.
//! A crash between the two leaves an identity with no profile; the next
//! attempt hits `EmailExists` and the bounded recovery search repairs it.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use secrecy::SecretString;

use super::{EmailDispatcher, SetupTokenManager};
use crate::application::BackgroundTasks;
use crate::domain::email::{EmailMessage, EmailMetadata};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::order::Order;
use crate::domain::user::{normalize_email, AccountStatus, User};
use crate::ports::{Identity, IdentityError, IdentityStore, OrderStore, UserStore};

/// Length of the throwaway password set on provisioned identities.
const GENERATED_PASSWORD_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    /// Base URL for the setup link in the welcome email.
    pub frontend_url: String,
    /// Identities per page during the recovery scan.
    pub page_size: u32,
    /// Page ceiling for the recovery scan.
    pub max_pages: u32,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            frontend_url: String::new(),
            page_size: 1000,
            max_pages: 20,
        }
    }
}

/// What provisioning did for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    /// The order already had an owner; only the entitlement was applied.
    EntitledOwner { user_id: UserId },
    /// A profile with the billing email existed; linked and upgraded.
    LinkedExistingUser { user_id: UserId },
    /// A new identity and profile were created.
    CreatedUser {
        user_id: UserId,
        setup_email_queued: bool,
    },
    /// Identity creation conflicted and the existing identity was found.
    RecoveredIdentity { user_id: UserId },
    /// Nothing could be linked; an operator has to step in.
    ManualActionRequired { reason: &'static str },
}

impl ProvisioningOutcome {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            ProvisioningOutcome::EntitledOwner { user_id }
            | ProvisioningOutcome::LinkedExistingUser { user_id }
            | ProvisioningOutcome::CreatedUser { user_id, .. }
            | ProvisioningOutcome::RecoveredIdentity { user_id } => Some(*user_id),
            ProvisioningOutcome::ManualActionRequired { .. } => None,
        }
    }
}

pub struct GuestProvisioningService {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserStore>,
    identities: Arc<dyn IdentityStore>,
    tokens: Arc<SetupTokenManager>,
    emails: Arc<EmailDispatcher>,
    tasks: Arc<BackgroundTasks>,
    settings: ProvisioningSettings,
}

impl GuestProvisioningService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
        identities: Arc<dyn IdentityStore>,
        tokens: Arc<SetupTokenManager>,
        emails: Arc<EmailDispatcher>,
        tasks: Arc<BackgroundTasks>,
        settings: ProvisioningSettings,
    ) -> Self {
        Self {
            orders,
            users,
            identities,
            tokens,
            emails,
            tasks,
            settings,
        }
    }

    /// Links and entitles a user for a paid order.
    ///
    /// Storage errors propagate; identity and email problems are logged and
    /// reported through the outcome instead.
    pub async fn provision(
        &self,
        order: &Order,
        billing_email: Option<&str>,
        owner_hint: Option<UserId>,
    ) -> Result<ProvisioningOutcome, DomainError> {
        if let Some(owner) = order.user_id.or(owner_hint) {
            return self.entitle_owner(order, owner, billing_email).await;
        }

        let email = match billing_email
            .or(order.billing_email.as_deref())
            .map(normalize_email)
        {
            Some(Ok(email)) => email,
            _ => {
                tracing::error!(
                    order_id = %order.id,
                    requires_manual_action = true,
                    "paid guest order has no usable billing email"
                );
                return Ok(ProvisioningOutcome::ManualActionRequired {
                    reason: "missing_billing_email",
                });
            }
        };

        if let Some(mut user) = self.users.find_by_email(&email).await? {
            self.grant_and_link(order, &mut user).await?;
            tracing::info!(
                order_id = %order.id,
                user_id = %user.id,
                "guest purchase linked to existing user"
            );
            return Ok(ProvisioningOutcome::LinkedExistingUser { user_id: user.id });
        }

        match self.identities.create_user(&email, &generate_password()).await {
            Ok(identity) => {
                let mut user = User::new(identity.id, &email, AccountStatus::PendingSetup)?;
                self.grant_and_link(order, &mut user).await?;
                tracing::info!(
                    order_id = %order.id,
                    user_id = %user.id,
                    "provisioned account for guest purchase"
                );
                let setup_email_queued = self.queue_setup_email(order, &user).await;
                Ok(ProvisioningOutcome::CreatedUser {
                    user_id: user.id,
                    setup_email_queued,
                })
            }
            Err(IdentityError::EmailExists) => self.recover(order, &email).await,
            Err(err) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %err,
                    requires_manual_action = true,
                    "could not create identity for guest purchase"
                );
                Ok(ProvisioningOutcome::ManualActionRequired {
                    reason: "identity_creation_failed",
                })
            }
        }
    }

    async fn entitle_owner(
        &self,
        order: &Order,
        owner: UserId,
        billing_email: Option<&str>,
    ) -> Result<ProvisioningOutcome, DomainError> {
        let mut user = match self.users.find_by_id(&owner).await? {
            Some(user) => user,
            None => match billing_email
                .or(order.billing_email.as_deref())
                .map(normalize_email)
            {
                Some(Ok(email)) => User::new(owner, &email, AccountStatus::Active)?,
                _ => {
                    tracing::error!(
                        order_id = %order.id,
                        user_id = %owner,
                        requires_manual_action = true,
                        "order owner has no profile and no email to create one"
                    );
                    return Ok(ProvisioningOutcome::ManualActionRequired {
                        reason: "owner_profile_missing",
                    });
                }
            },
        };

        user.apply_entitlement(order.plan_type, Timestamp::now());
        self.users.upsert(&user).await?;
        if order.user_id.is_none() {
            self.orders.link_user(&order.id, &owner).await?;
        }

        tracing::info!(order_id = %order.id, user_id = %owner, plan = order.plan_type.as_str(), "entitlement applied");
        Ok(ProvisioningOutcome::EntitledOwner { user_id: owner })
    }

    async fn recover(&self, order: &Order, email: &str) -> Result<ProvisioningOutcome, DomainError> {
        let identity = match self.find_identity(email).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::error!(
                    order_id = %order.id,
                    requires_manual_action = true,
                    "identity exists but could not be found; order left unlinked"
                );
                return Ok(ProvisioningOutcome::ManualActionRequired {
                    reason: "identity_recovery_failed",
                });
            }
            Err(err) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %err,
                    requires_manual_action = true,
                    "identity recovery failed; order left unlinked"
                );
                return Ok(ProvisioningOutcome::ManualActionRequired {
                    reason: "identity_recovery_failed",
                });
            }
        };

        let mut user = match self.users.find_by_id(&identity.id).await? {
            Some(user) => user,
            None => User::new(identity.id, email, AccountStatus::Active)?,
        };
        self.grant_and_link(order, &mut user).await?;

        tracing::warn!(
            order_id = %order.id,
            user_id = %user.id,
            "recovered existing identity after email conflict"
        );
        Ok(ProvisioningOutcome::RecoveredIdentity { user_id: user.id })
    }

    /// Indexed lookup where supported, otherwise a scan that stops on a
    /// short page or at the page ceiling.
    async fn find_identity(&self, email: &str) -> Result<Option<Identity>, IdentityError> {
        match self.identities.find_by_email(email).await {
            Err(IdentityError::Unsupported) => {}
            other => return other,
        }

        let per_page = self.settings.page_size.max(1);
        for page in 1..=self.settings.max_pages {
            let batch = self.identities.list_users(page, per_page).await?;
            if let Some(found) = batch.iter().find(|i| i.email.eq_ignore_ascii_case(email)) {
                return Ok(Some(found.clone()));
            }
            if batch.len() < per_page as usize {
                return Ok(None);
            }
        }

        tracing::warn!(
            max_pages = self.settings.max_pages,
            per_page,
            "identity scan reached page ceiling"
        );
        Ok(None)
    }

    async fn grant_and_link(&self, order: &Order, user: &mut User) -> Result<(), DomainError> {
        user.apply_entitlement(order.plan_type, Timestamp::now());
        self.users.upsert(user).await?;
        self.orders.link_user(&order.id, &user.id).await
    }

    /// Issues a setup token and sends the welcome email in the background.
    /// Failures are logged; the user and order linkage stands regardless.
    async fn queue_setup_email(&self, order: &Order, user: &User) -> bool {
        let token = match self.tokens.create(user.id, &user.email).await {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(
                    order_id = %order.id,
                    user_id = %user.id,
                    error = %err,
                    requires_manual_action = true,
                    "could not issue setup token"
                );
                return false;
            }
        };

        let setup_url = format!(
            "{}/setup-account?token={}",
            self.settings.frontend_url.trim_end_matches('/'),
            token.token
        );
        let message = EmailMessage::account_setup(
            &user.email,
            &setup_url,
            order.plan_type,
            self.tokens.ttl_hours(),
        );
        let metadata = EmailMetadata {
            order_id: Some(order.id.clone()),
            user_id: Some(user.id),
        };

        let emails = self.emails.clone();
        self.tasks.spawn("account_setup_email", async move {
            emails.send_with_logging(&message, &metadata).await;
        });
        true
    }
}

fn generate_password() -> SecretString {
    let password: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect();
    SecretString::new(password)
}
