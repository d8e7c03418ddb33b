//! User profile aggregate.

use serde::{Deserialize, Serialize};

use super::{AccountStatus, SubscriptionStatus};
use crate::domain::foundation::{StateMachine, Timestamp, UserId, ValidationError};
use crate::domain::order::{PlanType, ANNUAL_PLAN_DAYS};

/// Application-side user profile. The credential lives in the identity
/// store under the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub account_status: AccountStatus,
    pub subscription_status: SubscriptionStatus,
    pub plan: Option<PlanType>,
    pub subscription_expires_at: Option<Timestamp>,
    /// Unredeemed single-report purchases.
    pub report_credits: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Creates a free profile with the given account status.
    pub fn new(id: UserId, email: &str, account_status: AccountStatus) -> Result<Self, ValidationError> {
        let now = Timestamp::now();
        Ok(Self {
            id,
            email: normalize_email(email)?,
            account_status,
            subscription_status: SubscriptionStatus::Free,
            plan: None,
            subscription_expires_at: None,
            report_credits: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Grants what `plan` buys.
    ///
    /// Annual purchases extend from the later of now and the current
    /// expiry, so renewals stack. Single purchases add one report credit.
    pub fn apply_entitlement(&mut self, plan: PlanType, now: Timestamp) {
        match plan {
            PlanType::Annual => {
                let start = match self.subscription_expires_at {
                    Some(expiry) if expiry.is_after(&now) => expiry,
                    _ => now,
                };
                self.subscription_status = SubscriptionStatus::Premium;
                self.subscription_expires_at = Some(start.add_days(ANNUAL_PLAN_DAYS));
                self.plan = Some(PlanType::Annual);
            }
            PlanType::Single => {
                self.report_credits += 1;
                if self.plan.is_none() {
                    self.plan = Some(PlanType::Single);
                }
            }
        }
        self.updated_at = now;
    }

    /// Moves a provisioned account to active once a password is set.
    pub fn activate(&mut self) -> Result<(), ValidationError> {
        if self.account_status == AccountStatus::Active {
            return Ok(());
        }
        self.account_status = self.account_status.transition_to(AccountStatus::Active)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn has_premium(&self, now: Timestamp) -> bool {
        self.subscription_status == SubscriptionStatus::Premium
            && self
                .subscription_expires_at
                .map(|expiry| expiry.is_after(&now))
                .unwrap_or(false)
    }
}

/// Trims and lowercases an email, rejecting values without a local part
/// and a domain.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::empty_field("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ValidationError::invalid_format("email", "not an email address")),
    }
}
