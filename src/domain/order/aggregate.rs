//! Order aggregate.

use serde::{Deserialize, Serialize};

use super::{OrderStatus, PlanType};
use crate::domain::foundation::{OrderId, StateMachine, Timestamp, UserId, ValidationError};

/// A purchase attempt, created at checkout and resolved by the gateway
/// callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Amount in minor currency units.
    pub amount_minor: i64,
    pub currency: String,
    pub plan_type: PlanType,
    pub status: OrderStatus,
    /// `None` for guest checkouts.
    pub user_id: Option<UserId>,
    pub billing_email: Option<String>,
    pub tracking_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    /// Set while a callback owns provisioning for a paid order. Cleared
    /// again if provisioning failed on storage so a replay can finish it.
    pub provisioning_claimed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Terminal write applied to a pending order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCompletion {
    pub status: OrderStatus,
    pub tracking_id: Option<String>,
    pub gateway_response: serde_json::Value,
    pub completed_at: Timestamp,
}

impl OrderCompletion {
    /// Rejects completions that would not leave `Pending`.
    pub fn new(
        status: OrderStatus,
        tracking_id: Option<String>,
        gateway_response: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        OrderStatus::Pending.transition_to(status)?;
        Ok(Self {
            status,
            tracking_id: tracking_id.filter(|t| !t.is_empty()),
            gateway_response,
            completed_at: Timestamp::now(),
        })
    }
}

impl Order {
    /// Creates a pending order at checkout.
    pub fn new_pending(
        id: OrderId,
        amount_minor: i64,
        currency: impl Into<String>,
        plan_type: PlanType,
        user_id: Option<UserId>,
        billing_email: Option<String>,
    ) -> Result<Self, ValidationError> {
        if amount_minor <= 0 {
            return Err(ValidationError::invalid_format(
                "amount",
                "must be greater than zero",
            ));
        }
        let currency = currency.into().trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "must be a three-letter ISO code",
            ));
        }

        let now = Timestamp::now();
        Ok(Self {
            id,
            amount_minor,
            currency,
            plan_type,
            status: OrderStatus::Pending,
            user_id,
            billing_email: billing_email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
            tracking_id: None,
            gateway_response: None,
            provisioning_claimed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    /// Amount in major units, as reported to analytics.
    pub fn amount_major(&self) -> f64 {
        self.amount_minor as f64 / 100.0
    }

    /// Gateway amount string, always with two decimals.
    pub fn gateway_amount(&self) -> String {
        format!("{}.{:02}", self.amount_minor / 100, self.amount_minor % 100)
    }

    /// Applies a terminal write in memory, mirroring the store's
    /// conditional update. Returns false if the order already left pending.
    pub fn apply_completion(&mut self, completion: &OrderCompletion) -> bool {
        if self.status.transition_to(completion.status).is_err() {
            return false;
        }
        self.status = completion.status;
        self.tracking_id = completion.tracking_id.clone();
        self.gateway_response = Some(completion.gateway_response.clone());
        self.updated_at = completion.completed_at;
        if completion.status == OrderStatus::Success {
            self.provisioning_claimed_at = Some(completion.completed_at);
        }
        true
    }

    /// Paid, but no callback currently owns provisioning.
    pub fn awaits_provisioning(&self) -> bool {
        self.status == OrderStatus::Success && self.provisioning_claimed_at.is_none()
    }

    /// Takes ownership of provisioning. Returns false if already claimed
    /// or the order is not paid.
    pub fn claim_provisioning(&mut self, at: Timestamp) -> bool {
        if !self.awaits_provisioning() {
            return false;
        }
        self.provisioning_claimed_at = Some(at);
        self.updated_at = at;
        true
    }

    /// The failure reason recorded from the stored gateway response.
    pub fn recorded_failure_reason(&self) -> &str {
        let field = |key: &str| {
            self.gateway_response
                .as_ref()
                .and_then(|resp| resp.get(key))
                .and_then(serde_json::Value::as_str)
                .filter(|text| !text.is_empty())
        };
        field("failure_message")
            .or_else(|| field("status_message"))
            .or_else(|| field("order_status"))
            .unwrap_or("payment_failed")
    }
}
