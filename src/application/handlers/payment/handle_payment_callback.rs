//! HandlePaymentCallbackHandler - resolves an order from the gateway's
//! encrypted callback and decides where the paying user is sent.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::application::services::{ConversionTracker, GuestProvisioningService, ProvisioningOutcome};
use crate::domain::analytics::PurchaseEvent;
use crate::domain::foundation::OrderId;
use crate::domain::order::{Order, OrderCompletion, OrderStatus};
use crate::domain::payment::{CallbackError, GatewayResponse, PaymentRedirect};
use crate::ports::OrderStore;

/// Command carrying the raw callback form.
#[derive(Debug, Clone, Default)]
pub struct HandlePaymentCallbackCommand {
    /// The `encResp` form field, if present.
    pub enc_resp: Option<String>,
}

/// What the callback did to the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Provisioning ran for a paid order, on the first delivery or on a
    /// replay after a storage failure.
    Succeeded { provisioning: ProvisioningOutcome },
    /// Order moved to failed.
    PaymentFailed,
    /// Order had already left pending and needed nothing more.
    Duplicate,
    /// The callback could not be processed.
    Rejected { reason: &'static str },
}

#[derive(Debug, Clone)]
pub struct HandlePaymentCallbackResult {
    pub redirect: PaymentRedirect,
    pub outcome: CallbackOutcome,
}

/// Handler for gateway callbacks.
///
/// Infallible from the caller's side: every path ends in a redirect.
pub struct HandlePaymentCallbackHandler {
    orders: Arc<dyn OrderStore>,
    provisioning: Arc<GuestProvisioningService>,
    tracker: Arc<ConversionTracker>,
    working_key: SecretString,
    event_source_url: Option<String>,
}

impl HandlePaymentCallbackHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        provisioning: Arc<GuestProvisioningService>,
        tracker: Arc<ConversionTracker>,
        working_key: SecretString,
    ) -> Self {
        Self {
            orders,
            provisioning,
            tracker,
            working_key,
            event_source_url: None,
        }
    }

    /// Page reported as the conversion's source URL.
    pub fn with_event_source_url(mut self, url: impl Into<String>) -> Self {
        self.event_source_url = Some(url.into());
        self
    }

    pub async fn handle(&self, cmd: HandlePaymentCallbackCommand) -> HandlePaymentCallbackResult {
        let response = match self.decode(cmd) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "rejected payment callback");
                return rejected(&err, None);
            }
        };

        match self.process(&response).await {
            Ok(result) => result,
            Err(err) => {
                if matches!(err, CallbackError::Storage(_)) {
                    tracing::error!(
                        order_id = %response.order_id,
                        error = %err,
                        requires_manual_action = true,
                        "payment callback failed on storage"
                    );
                } else {
                    tracing::warn!(order_id = %response.order_id, error = %err, "rejected payment callback");
                }
                rejected(&err, Some(&response))
            }
        }
    }

    fn decode(&self, cmd: HandlePaymentCallbackCommand) -> Result<GatewayResponse, CallbackError> {
        let enc_resp = cmd
            .enc_resp
            .filter(|value| !value.trim().is_empty())
            .ok_or(CallbackError::MissingPayload)?;
        GatewayResponse::decode(&enc_resp, self.working_key.expose_secret())
    }

    async fn process(
        &self,
        response: &GatewayResponse,
    ) -> Result<HandlePaymentCallbackResult, CallbackError> {
        let mut order = self.load(&response.order_id).await?;

        let succeeded = response.is_success();
        let status = if succeeded {
            OrderStatus::Success
        } else {
            OrderStatus::Failed
        };
        let completion = OrderCompletion::new(
            status,
            Some(response.tracking_id.clone()),
            response.to_json(),
        )?;

        // Zero rows updated means another delivery already won.
        if !self.orders.complete_if_pending(&order.id, &completion).await? {
            return self.replay(response).await;
        }
        order.apply_completion(&completion);

        if !succeeded {
            tracing::info!(
                order_id = %order.id,
                order_status = %response.order_status,
                "payment failed"
            );
            return Ok(HandlePaymentCallbackResult {
                redirect: settled_redirect(&order),
                outcome: CallbackOutcome::PaymentFailed,
            });
        }

        tracing::info!(
            order_id = %order.id,
            plan = order.plan_type.as_str(),
            guest = order.is_guest(),
            "payment succeeded"
        );
        self.provision_paid(&order, response).await
    }

    /// A later delivery for a settled order. The stored order decides the
    /// redirect; provisioning only reruns if an earlier attempt released
    /// its claim.
    async fn replay(
        &self,
        response: &GatewayResponse,
    ) -> Result<HandlePaymentCallbackResult, CallbackError> {
        let order = self.load(&response.order_id).await?;

        if !order.awaits_provisioning() || !self.orders.claim_provisioning(&order.id).await? {
            tracing::info!(
                order_id = %order.id,
                order_status = order.status.as_str(),
                "duplicate payment callback ignored"
            );
            return Ok(HandlePaymentCallbackResult {
                redirect: settled_redirect(&order),
                outcome: CallbackOutcome::Duplicate,
            });
        }

        tracing::warn!(order_id = %order.id, "resuming provisioning for paid order");
        self.provision_paid(&order, response).await
    }

    async fn provision_paid(
        &self,
        order: &Order,
        response: &GatewayResponse,
    ) -> Result<HandlePaymentCallbackResult, CallbackError> {
        let provisioning = match self
            .provisioning
            .provision(order, response.billing_email(), response.user_hint())
            .await
        {
            Ok(provisioning) => provisioning,
            Err(err) => {
                if let Err(release_err) = self.orders.release_provisioning(&order.id).await {
                    tracing::error!(
                        order_id = %order.id,
                        error = %release_err,
                        requires_manual_action = true,
                        "could not release provisioning claim"
                    );
                }
                return Err(err.into());
            }
        };

        let email = response.billing_email().or(order.billing_email.as_deref());
        let mut event = PurchaseEvent::from_order(order, email, provisioning.user_id());
        if let Some(url) = &self.event_source_url {
            event = event.with_source_url(url.clone());
        }
        self.tracker.track_purchase_in_background(event);

        Ok(HandlePaymentCallbackResult {
            redirect: settled_redirect(order),
            outcome: CallbackOutcome::Succeeded { provisioning },
        })
    }

    async fn load(&self, id: &OrderId) -> Result<Order, CallbackError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| CallbackError::OrderNotFound(id.clone()))
    }
}

/// Redirect for an order that has left pending, built from what was stored.
fn settled_redirect(order: &Order) -> PaymentRedirect {
    let plan = Some(order.plan_type);
    match order.status {
        OrderStatus::Success => PaymentRedirect::success(
            order.id.clone(),
            order.tracking_id.clone().unwrap_or_default(),
            plan,
        ),
        _ => PaymentRedirect::failure(Some(order.id.clone()), order.recorded_failure_reason(), plan),
    }
}

fn rejected(err: &CallbackError, response: Option<&GatewayResponse>) -> HandlePaymentCallbackResult {
    let reason = err.redirect_reason();
    HandlePaymentCallbackResult {
        redirect: PaymentRedirect::failure(
            response.map(|r| r.order_id.clone()),
            reason,
            response.and_then(GatewayResponse::plan_type),
        ),
        outcome: CallbackOutcome::Rejected { reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::analytics::MockAnalyticsProvider;
    use crate::adapters::email::MockEmailProvider;
    use crate::adapters::identity::InMemoryIdentityStore;
    use crate::adapters::memory::{
        InMemoryFailedEmailStore, InMemoryOrderStore, InMemorySetupTokenStore, InMemoryUserStore,
    };
    use crate::application::services::{
        EmailDispatcher, ProvisioningSettings, RetryPolicy, SetupTokenManager,
    };
    use crate::application::BackgroundTasks;
    use crate::domain::foundation::{OrderId, UserId};
    use crate::domain::order::{Order, PlanType};
    use crate::domain::payment::{encrypt, stringify_fields};
    use crate::domain::user::{AccountStatus, User};
    use crate::ports::UserStore;
    use std::time::Duration;

    const KEY: &str = "0123456789ABCDEF0123456789ABCDEF";

    struct Fixture {
        handler: Arc<HandlePaymentCallbackHandler>,
        orders: Arc<InMemoryOrderStore>,
        users: Arc<InMemoryUserStore>,
        analytics: Arc<MockAnalyticsProvider>,
        tasks: Arc<BackgroundTasks>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let analytics = Arc::new(MockAnalyticsProvider::new());
        let tasks = Arc::new(BackgroundTasks::new());

        let dispatcher = Arc::new(EmailDispatcher::new(
            Arc::new(MockEmailProvider::new()),
            Arc::new(InMemoryFailedEmailStore::new()),
            RetryPolicy::new(1, Duration::ZERO),
        ));
        let provisioning = Arc::new(GuestProvisioningService::new(
            orders.clone(),
            users.clone(),
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(SetupTokenManager::new(Arc::new(InMemorySetupTokenStore::new()), 48)),
            dispatcher,
            tasks.clone(),
            ProvisioningSettings {
                frontend_url: "https://app.test".to_string(),
                ..ProvisioningSettings::default()
            },
        ));
        let tracker = Arc::new(ConversionTracker::new(analytics.clone(), tasks.clone()));
        let handler = Arc::new(HandlePaymentCallbackHandler::new(
            orders.clone(),
            provisioning,
            tracker,
            SecretString::new(KEY.to_string()),
        ));

        Fixture {
            handler,
            orders,
            users,
            analytics,
            tasks,
        }
    }

    async fn seed_order(f: &Fixture, user_id: Option<UserId>) -> Order {
        let order = Order::new_pending(
            OrderId::generate(),
            49_900,
            "INR",
            PlanType::Single,
            user_id,
            Some("buyer@example.com".to_string()),
        )
        .unwrap();
        f.orders.insert(&order).await.unwrap();
        order
    }

    fn callback(fields: &[(&str, &str)]) -> HandlePaymentCallbackCommand {
        HandlePaymentCallbackCommand {
            enc_resp: Some(encrypt(&stringify_fields(fields.iter().copied()), KEY).unwrap()),
        }
    }

    #[tokio::test]
    async fn missing_payload_is_invalid_response() {
        let f = fixture();
        let result = f.handler.handle(HandlePaymentCallbackCommand::default()).await;
        assert_eq!(
            result.outcome,
            CallbackOutcome::Rejected {
                reason: "invalid_response"
            }
        );
        assert_eq!(
            result.redirect,
            PaymentRedirect::failure(None, "invalid_response", None)
        );
    }

    #[tokio::test]
    async fn undecryptable_payload_fails_verification() {
        let f = fixture();
        let result = f
            .handler
            .handle(HandlePaymentCallbackCommand {
                enc_resp: Some("not-hex".to_string()),
            })
            .await;
        assert_eq!(
            result.outcome,
            CallbackOutcome::Rejected {
                reason: "payment_verification_failed"
            }
        );
    }

    #[tokio::test]
    async fn payload_without_order_id_is_invalid_response() {
        let f = fixture();
        let result = f.handler.handle(callback(&[("order_status", "Success")])).await;
        assert_eq!(
            result.outcome,
            CallbackOutcome::Rejected {
                reason: "invalid_response"
            }
        );
    }

    #[tokio::test]
    async fn unknown_order_redirects_with_order_not_found() {
        let f = fixture();
        let result = f
            .handler
            .handle(callback(&[("order_id", "ORD_404"), ("order_status", "Success")]))
            .await;

        assert_eq!(
            result.outcome,
            CallbackOutcome::Rejected {
                reason: "order_not_found"
            }
        );
        assert!(result
            .redirect
            .to_url("https://app.test")
            .contains("order_id=ORD_404&reason=order_not_found"));
    }

    #[tokio::test]
    async fn storage_failure_redirects_with_processing_error() {
        let f = fixture();
        let order = seed_order(&f, None).await;
        f.orders.fail_reads(true).await;

        let result = f
            .handler
            .handle(callback(&[("order_id", order.id.as_str()), ("order_status", "Success")]))
            .await;
        assert_eq!(
            result.outcome,
            CallbackOutcome::Rejected {
                reason: "processing_error"
            }
        );
    }

    #[tokio::test]
    async fn failed_payment_marks_order_failed_without_side_effects() {
        let f = fixture();
        let order = seed_order(&f, None).await;

        let result = f
            .handler
            .handle(callback(&[
                ("order_id", order.id.as_str()),
                ("order_status", "Failure"),
                ("failure_message", "Card declined"),
            ]))
            .await;
        f.tasks.drain().await;

        assert_eq!(result.outcome, CallbackOutcome::PaymentFailed);
        assert_eq!(
            result.redirect,
            PaymentRedirect::failure(Some(order.id.clone()), "Card declined", Some(PlanType::Single))
        );
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
        assert!(f.analytics.events().is_empty());
    }

    #[tokio::test]
    async fn status_match_is_case_insensitive() {
        let f = fixture();
        let owner = User::new(UserId::new(), "owner@example.com", AccountStatus::Active).unwrap();
        f.users.upsert(&owner).await.unwrap();
        let order = seed_order(&f, Some(owner.id)).await;

        let result = f
            .handler
            .handle(callback(&[
                ("order_id", order.id.as_str()),
                ("order_status", "SUCCESS"),
                ("tracking_id", "T-9"),
            ]))
            .await;
        f.tasks.drain().await;

        assert!(result.redirect.is_success());
        assert_eq!(
            result.outcome,
            CallbackOutcome::Succeeded {
                provisioning: ProvisioningOutcome::EntitledOwner { user_id: owner.id }
            }
        );
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.tracking_id.as_deref(), Some("T-9"));
        assert!(stored.gateway_response.is_some());
        assert_eq!(f.analytics.events().len(), 1);
    }

    #[tokio::test]
    async fn replayed_success_is_duplicate() {
        let f = fixture();
        let owner = User::new(UserId::new(), "owner@example.com", AccountStatus::Active).unwrap();
        f.users.upsert(&owner).await.unwrap();
        let order = seed_order(&f, Some(owner.id)).await;
        let cmd = callback(&[
            ("order_id", order.id.as_str()),
            ("order_status", "Success"),
            ("tracking_id", "T-1"),
        ]);

        let first = f.handler.handle(cmd.clone()).await;
        let second = f.handler.handle(cmd).await;
        f.tasks.drain().await;

        assert_eq!(second.outcome, CallbackOutcome::Duplicate);
        assert_eq!(first.redirect, second.redirect);
        let user = f.users.find_by_id(&owner.id).await.unwrap().unwrap();
        assert_eq!(user.report_credits, 1);
        assert_eq!(f.analytics.events().len(), 1);
    }

    #[tokio::test]
    async fn replay_with_other_status_keeps_stored_redirect() {
        let f = fixture();
        let owner = User::new(UserId::new(), "owner@example.com", AccountStatus::Active).unwrap();
        f.users.upsert(&owner).await.unwrap();
        let order = seed_order(&f, Some(owner.id)).await;

        let first = f
            .handler
            .handle(callback(&[
                ("order_id", order.id.as_str()),
                ("order_status", "Success"),
                ("tracking_id", "T-1"),
            ]))
            .await;
        let second = f
            .handler
            .handle(callback(&[
                ("order_id", order.id.as_str()),
                ("order_status", "Aborted"),
            ]))
            .await;
        f.tasks.drain().await;

        assert_eq!(second.outcome, CallbackOutcome::Duplicate);
        assert_eq!(second.redirect, first.redirect);
        assert_eq!(
            second.redirect,
            PaymentRedirect::success(order.id.clone(), "T-1", Some(PlanType::Single))
        );
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Success);
        assert_eq!(f.analytics.events().len(), 1);
    }

    #[tokio::test]
    async fn success_after_failure_still_redirects_to_failure() {
        let f = fixture();
        let order = seed_order(&f, None).await;

        let first = f
            .handler
            .handle(callback(&[
                ("order_id", order.id.as_str()),
                ("order_status", "Failure"),
                ("failure_message", "Card declined"),
            ]))
            .await;
        let second = f
            .handler
            .handle(callback(&[
                ("order_id", order.id.as_str()),
                ("order_status", "Success"),
                ("tracking_id", "T-2"),
            ]))
            .await;
        f.tasks.drain().await;

        assert_eq!(second.outcome, CallbackOutcome::Duplicate);
        assert_eq!(second.redirect, first.redirect);
        assert_eq!(f.users.len().await, 0);
        assert!(f.analytics.events().is_empty());
    }

    #[tokio::test]
    async fn guest_provisioning_resumes_after_storage_failure() {
        let f = fixture();
        let order = seed_order(&f, None).await;
        let cmd = callback(&[
            ("order_id", order.id.as_str()),
            ("order_status", "Success"),
            ("tracking_id", "T-3"),
        ]);

        f.users.fail_writes(true).await;
        let first = f.handler.handle(cmd.clone()).await;
        assert_eq!(
            first.outcome,
            CallbackOutcome::Rejected {
                reason: "processing_error"
            }
        );
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Success);
        assert!(stored.awaits_provisioning());

        f.users.fail_writes(false).await;
        let second = f.handler.handle(cmd.clone()).await;
        f.tasks.drain().await;

        // The first attempt created the identity before the profile write failed.
        let user_id = match second.outcome {
            CallbackOutcome::Succeeded {
                provisioning: ProvisioningOutcome::RecoveredIdentity { user_id },
            } => user_id,
            other => panic!("unexpected outcome {other:?}"),
        };
        assert_eq!(
            second.redirect,
            PaymentRedirect::success(order.id.clone(), "T-3", Some(PlanType::Single))
        );
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, Some(user_id));
        assert!(!stored.awaits_provisioning());
        let user = f.users.find_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.report_credits, 1);
        assert_eq!(f.analytics.events().len(), 1);

        let third = f.handler.handle(cmd).await;
        f.tasks.drain().await;
        assert_eq!(third.outcome, CallbackOutcome::Duplicate);
        let user = f.users.find_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.report_credits, 1);
        assert_eq!(f.analytics.events().len(), 1);
    }

    #[tokio::test]
    async fn owner_entitlement_resumes_after_storage_failure_without_double_grant() {
        let f = fixture();
        let owner = User::new(UserId::new(), "owner@example.com", AccountStatus::Active).unwrap();
        f.users.upsert(&owner).await.unwrap();
        let order = seed_order(&f, Some(owner.id)).await;
        let cmd = callback(&[("order_id", order.id.as_str()), ("order_status", "Success")]);

        f.users.fail_writes(true).await;
        let first = f.handler.handle(cmd.clone()).await;
        f.users.fail_writes(false).await;
        let second = f.handler.handle(cmd.clone()).await;
        let third = f.handler.handle(cmd).await;
        f.tasks.drain().await;

        assert!(matches!(first.outcome, CallbackOutcome::Rejected { .. }));
        assert_eq!(
            second.outcome,
            CallbackOutcome::Succeeded {
                provisioning: ProvisioningOutcome::EntitledOwner { user_id: owner.id }
            }
        );
        assert_eq!(third.outcome, CallbackOutcome::Duplicate);
        let user = f.users.find_by_id(&owner.id).await.unwrap().unwrap();
        assert_eq!(user.report_credits, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deliveries_provision_once() {
        let f = fixture();
        let order = seed_order(&f, None).await;
        let cmd = callback(&[
            ("order_id", order.id.as_str()),
            ("order_status", "Success"),
            ("tracking_id", "T-4"),
        ]);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let handler = f.handler.clone();
            let cmd = cmd.clone();
            handles.push(tokio::spawn(async move { handler.handle(cmd).await }));
        }

        let mut succeeded = 0;
        let mut duplicates = 0;
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.redirect.is_success());
            match result.outcome {
                CallbackOutcome::Succeeded { .. } => succeeded += 1,
                CallbackOutcome::Duplicate => duplicates += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        f.tasks.drain().await;

        assert_eq!(succeeded, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(f.users.len().await, 1);
        assert_eq!(f.analytics.events().len(), 1);
    }
}
