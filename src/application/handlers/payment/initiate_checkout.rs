//! InitiateCheckoutHandler - creates a pending order and the encrypted
//! request the browser posts to the gateway.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::PaymentConfig;
use crate::domain::foundation::{DomainError, OrderId, UserId, ValidationError};
use crate::domain::order::{Order, PlanType};
use crate::domain::payment::{encrypt, stringify_fields, CryptoError};
use crate::domain::user::normalize_email;
use crate::ports::OrderStore;

/// Command to start a checkout.
#[derive(Debug, Clone)]
pub struct InitiateCheckoutCommand {
    pub plan_type: PlanType,
    /// Signed-in buyer, `None` for guest checkout.
    pub user_id: Option<UserId>,
    /// Required for guests; becomes the provisioned account's email.
    pub billing_email: Option<String>,
    pub billing_name: Option<String>,
}

/// Everything the browser needs to post to the gateway.
#[derive(Debug, Clone)]
pub struct InitiateCheckoutResult {
    pub order_id: OrderId,
    pub gateway_url: String,
    pub enc_request: String,
    pub access_code: String,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("guest checkout requires a billing email")]
    MissingBillingEmail,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not encrypt gateway request: {0}")]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Storage(#[from] DomainError),
}

/// Gateway merchant settings used to build requests.
pub struct CheckoutSettings {
    pub merchant_id: String,
    pub access_code: String,
    pub working_key: SecretString,
    pub gateway_url: String,
    pub redirect_url: String,
    pub cancel_url: String,
    pub currency: String,
    pub language: String,
    pub annual_price_minor: i64,
    pub single_price_minor: i64,
}

impl CheckoutSettings {
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self {
            merchant_id: config.merchant_id.clone(),
            access_code: config.access_code.clone(),
            working_key: SecretString::new(config.working_key.clone()),
            gateway_url: config.gateway_url.clone(),
            redirect_url: config.redirect_url.clone(),
            cancel_url: config.cancel_url.clone(),
            currency: config.currency.clone(),
            language: config.language.clone(),
            annual_price_minor: config.price_for(PlanType::Annual),
            single_price_minor: config.price_for(PlanType::Single),
        }
    }

    fn price_for(&self, plan: PlanType) -> i64 {
        match plan {
            PlanType::Annual => self.annual_price_minor,
            PlanType::Single => self.single_price_minor,
        }
    }
}

pub struct InitiateCheckoutHandler {
    orders: Arc<dyn OrderStore>,
    settings: CheckoutSettings,
}

impl InitiateCheckoutHandler {
    pub fn new(orders: Arc<dyn OrderStore>, settings: CheckoutSettings) -> Self {
        Self { orders, settings }
    }

    pub async fn handle(
        &self,
        cmd: InitiateCheckoutCommand,
    ) -> Result<InitiateCheckoutResult, CheckoutError> {
        let billing_email = match cmd.billing_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => Some(normalize_email(email)?),
            _ => None,
        };
        if cmd.user_id.is_none() && billing_email.is_none() {
            return Err(CheckoutError::MissingBillingEmail);
        }
        if let Some(email) = &billing_email {
            if email.contains(['&', '=']) {
                return Err(ValidationError::invalid_format(
                    "billing_email",
                    "must not contain '&' or '='",
                )
                .into());
            }
        }

        let order = Order::new_pending(
            OrderId::generate(),
            self.settings.price_for(cmd.plan_type),
            self.settings.currency.as_str(),
            cmd.plan_type,
            cmd.user_id,
            billing_email.clone(),
        )?;

        let user_param = cmd.user_id.map(|id| id.to_string()).unwrap_or_default();
        let billing_name = cmd.billing_name.as_deref().map(field_safe).unwrap_or_default();
        let amount = order.gateway_amount();
        let fields = [
            ("merchant_id", self.settings.merchant_id.as_str()),
            ("order_id", order.id.as_str()),
            ("currency", order.currency.as_str()),
            ("amount", amount.as_str()),
            ("redirect_url", self.settings.redirect_url.as_str()),
            ("cancel_url", self.settings.cancel_url.as_str()),
            ("language", self.settings.language.as_str()),
            ("billing_email", billing_email.as_deref().unwrap_or_default()),
            ("billing_name", billing_name.as_str()),
            ("merchant_param1", order.plan_type.as_str()),
            ("merchant_param2", user_param.as_str()),
        ];
        let enc_request = encrypt(
            &stringify_fields(fields),
            self.settings.working_key.expose_secret(),
        )?;

        self.orders.insert(&order).await?;
        tracing::info!(
            order_id = %order.id,
            plan = order.plan_type.as_str(),
            guest = order.is_guest(),
            "checkout initiated"
        );

        Ok(InitiateCheckoutResult {
            order_id: order.id,
            gateway_url: self.settings.gateway_url.clone(),
            enc_request,
            access_code: self.settings.access_code.clone(),
        })
    }
}

/// Drops characters that would break the unencoded field string.
fn field_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '&' | '=') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryOrderStore;
    use crate::config::test_payment_config;
    use crate::domain::order::OrderStatus;
    use crate::domain::payment::{decrypt, parse_fields};

    fn handler() -> (InitiateCheckoutHandler, Arc<InMemoryOrderStore>, CheckoutSettings) {
        let orders = Arc::new(InMemoryOrderStore::new());
        let config = test_payment_config();
        let settings = CheckoutSettings::from_config(&config);
        (
            InitiateCheckoutHandler::new(orders.clone(), CheckoutSettings::from_config(&config)),
            orders,
            settings,
        )
    }

    fn guest(plan: PlanType) -> InitiateCheckoutCommand {
        InitiateCheckoutCommand {
            plan_type: plan,
            user_id: None,
            billing_email: Some(" Guest@Example.com ".to_string()),
            billing_name: Some("Asha & Co".to_string()),
        }
    }

    #[tokio::test]
    async fn guest_checkout_creates_pending_order_and_encrypted_request() {
        let (handler, orders, settings) = handler();

        let result = handler.handle(guest(PlanType::Annual)).await.unwrap();

        let order = orders.find_by_id(&result.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.amount_minor, settings.annual_price_minor);
        assert_eq!(order.billing_email.as_deref(), Some("guest@example.com"));
        assert!(order.is_guest());

        let plaintext = decrypt(&result.enc_request, settings.working_key.expose_secret()).unwrap();
        let fields = parse_fields(&plaintext);
        assert_eq!(fields["order_id"], result.order_id.as_str());
        assert_eq!(fields["merchant_id"], settings.merchant_id);
        assert_eq!(fields["amount"], order.gateway_amount());
        assert_eq!(fields["merchant_param1"], "annual");
        assert_eq!(fields["merchant_param2"], "");
        assert_eq!(fields["billing_email"], "guest@example.com");
        assert_eq!(fields["billing_name"], "Asha  Co");
        assert_eq!(result.access_code, settings.access_code);
        assert_eq!(result.gateway_url, settings.gateway_url);
    }

    #[tokio::test]
    async fn signed_in_checkout_carries_user_id() {
        let (handler, orders, settings) = handler();
        let user_id = UserId::new();

        let result = handler
            .handle(InitiateCheckoutCommand {
                plan_type: PlanType::Single,
                user_id: Some(user_id),
                billing_email: None,
                billing_name: None,
            })
            .await
            .unwrap();

        let order = orders.find_by_id(&result.order_id).await.unwrap().unwrap();
        assert_eq!(order.user_id, Some(user_id));
        let fields = parse_fields(
            &decrypt(&result.enc_request, settings.working_key.expose_secret()).unwrap(),
        );
        assert_eq!(fields["merchant_param2"], user_id.to_string());
        assert_eq!(fields["merchant_param1"], "single");
    }

    #[tokio::test]
    async fn guest_checkout_without_email_is_rejected() {
        let (handler, orders, _) = handler();
        let mut cmd = guest(PlanType::Single);
        cmd.billing_email = Some("   ".to_string());

        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, CheckoutError::MissingBillingEmail));
        assert_eq!(orders.len().await, 0);
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let (handler, _, _) = handler();
        let mut cmd = guest(PlanType::Single);
        cmd.billing_email = Some("not-an-email".to_string());

        assert!(matches!(
            handler.handle(cmd).await,
            Err(CheckoutError::Validation(_))
        ));
    }
}
