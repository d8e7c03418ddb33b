//! Wiring: builds services and handlers from configuration and adapters.
//!
//! Shared by the binary and the integration tests so both exercise the
//! same object graph.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use sqlx::PgPool;

use crate::adapters::http::AppState;
use crate::adapters::memory::{
    InMemoryFailedEmailStore, InMemoryOrderStore, InMemorySetupTokenStore, InMemoryUserStore,
};
use crate::adapters::postgres::{
    PostgresFailedEmailStore, PostgresOrderStore, PostgresSetupTokenStore, PostgresUserStore,
};
use crate::application::handlers::account::{
    CompleteAccountSetupHandler, VerifySetupTokenHandler,
};
use crate::application::handlers::payment::{
    CheckoutSettings, HandlePaymentCallbackHandler, InitiateCheckoutHandler,
};
use crate::application::services::{
    ConversionTracker, EmailDispatcher, GuestProvisioningService, ProvisioningSettings,
    RetryPolicy, SetupTokenManager,
};
use crate::application::BackgroundTasks;
use crate::config::AppConfig;
use crate::ports::{
    AnalyticsProvider, EmailProvider, FailedEmailStore, IdentityStore, OrderStore,
    SetupTokenStore, UserStore,
};

/// The four persistence ports.
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn SetupTokenStore>,
    pub failed_emails: Arc<dyn FailedEmailStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(PostgresOrderStore::new(pool.clone())),
            users: Arc::new(PostgresUserStore::new(pool.clone())),
            tokens: Arc::new(PostgresSetupTokenStore::new(pool.clone())),
            failed_emails: Arc::new(PostgresFailedEmailStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            tokens: Arc::new(InMemorySetupTokenStore::new()),
            failed_emails: Arc::new(InMemoryFailedEmailStore::new()),
        }
    }
}

/// Third-party services reached over HTTP.
#[derive(Clone)]
pub struct Collaborators {
    pub identities: Arc<dyn IdentityStore>,
    pub email: Arc<dyn EmailProvider>,
    pub analytics: Arc<dyn AnalyticsProvider>,
}

/// Everything the binary needs after wiring.
pub struct Application {
    pub state: AppState,
    pub tokens: Arc<SetupTokenManager>,
    pub tasks: Arc<BackgroundTasks>,
    pub request_timeout: Duration,
}

/// Builds the services and handlers.
pub fn build(config: &AppConfig, stores: Stores, collaborators: Collaborators) -> Application {
    let tasks = Arc::new(BackgroundTasks::new());
    let tokens = Arc::new(SetupTokenManager::new(
        stores.tokens.clone(),
        config.identity.setup_token_ttl_hours,
    ));
    let emails = Arc::new(EmailDispatcher::new(
        collaborators.email,
        stores.failed_emails.clone(),
        RetryPolicy::new(config.email.max_attempts, config.email.base_backoff()),
    ));
    let tracker = Arc::new(ConversionTracker::new(collaborators.analytics, tasks.clone()));

    let provisioning = Arc::new(GuestProvisioningService::new(
        stores.orders.clone(),
        stores.users.clone(),
        collaborators.identities.clone(),
        tokens.clone(),
        emails,
        tasks.clone(),
        ProvisioningSettings {
            frontend_url: config.payment.frontend_url.clone(),
            page_size: config.identity.page_size,
            max_pages: config.identity.max_pages,
        },
    ));

    let callback_handler = HandlePaymentCallbackHandler::new(
        stores.orders.clone(),
        provisioning,
        tracker,
        SecretString::new(config.payment.working_key.clone()),
    )
    .with_event_source_url(format!(
        "{}/pricing",
        config.payment.frontend_url.trim_end_matches('/')
    ));

    let checkout_handler = InitiateCheckoutHandler::new(
        stores.orders.clone(),
        CheckoutSettings::from_config(&config.payment),
    );

    let state = AppState {
        callback_handler: Arc::new(callback_handler),
        checkout_handler: Arc::new(checkout_handler),
        verify_token_handler: Arc::new(VerifySetupTokenHandler::new(tokens.clone())),
        account_setup_handler: Arc::new(CompleteAccountSetupHandler::new(
            tokens.clone(),
            collaborators.identities,
            stores.users,
            config.identity.min_password_len,
        )),
        frontend_url: Arc::from(config.payment.frontend_url.as_str()),
    };

    Application {
        state,
        tokens,
        tasks,
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    }
}

/// Periodically deletes expired and long-used setup tokens. Failures are
/// retried on the next tick.
pub async fn run_token_cleanup(
    tokens: Arc<SetupTokenManager>,
    interval: Duration,
    retention_days: i64,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(e) = tokens.cleanup(retention_days).await {
            tracing::warn!(error = %e, "Setup token cleanup failed");
        }
    }
}
