//! Account and subscription status.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Whether the user has chosen a password yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Provisioned from a guest purchase; waiting on the setup link.
    PendingSetup,
    Active,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::PendingSetup => "pending_setup",
            AccountStatus::Active => "active",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_setup" => Ok(AccountStatus::PendingSetup),
            "active" => Ok(AccountStatus::Active),
            other => Err(ValidationError::invalid_format(
                "account_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for AccountStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (AccountStatus::PendingSetup, AccountStatus::Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            AccountStatus::PendingSetup => vec![AccountStatus::Active],
            AccountStatus::Active => vec![],
        }
    }
}

/// Subscription entitlement flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Free,
    Premium,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Premium => "premium",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionStatus::Free),
            "premium" => Ok(SubscriptionStatus::Premium),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_setup_activates_once() {
        assert!(AccountStatus::PendingSetup.can_transition_to(&AccountStatus::Active));
        assert!(AccountStatus::Active.is_terminal());
    }

    #[test]
    fn storage_values_parse() {
        assert_eq!(
            "pending_setup".parse::<AccountStatus>().unwrap(),
            AccountStatus::PendingSetup
        );
        assert_eq!(
            "premium".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Premium
        );
        assert!("gold".parse::<SubscriptionStatus>().is_err());
    }
}
