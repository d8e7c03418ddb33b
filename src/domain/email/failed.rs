//! Records of emails that could not be delivered.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{EmailMessage, EmailType};
use crate::domain::foundation::{
    FailedEmailId, OrderId, StateMachine, Timestamp, UserId, ValidationError,
};

/// Remediation state of a failed email. Driven by an external retry worker
/// after the record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedEmailStatus {
    Failed,
    Retrying,
    PermanentlyFailed,
    Resolved,
}

impl FailedEmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedEmailStatus::Failed => "failed",
            FailedEmailStatus::Retrying => "retrying",
            FailedEmailStatus::PermanentlyFailed => "permanently_failed",
            FailedEmailStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for FailedEmailStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "failed" => Ok(FailedEmailStatus::Failed),
            "retrying" => Ok(FailedEmailStatus::Retrying),
            "permanently_failed" => Ok(FailedEmailStatus::PermanentlyFailed),
            "resolved" => Ok(FailedEmailStatus::Resolved),
            other => Err(ValidationError::invalid_format(
                "failed_email_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for FailedEmailStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FailedEmailStatus::*;
        matches!(
            (self, target),
            (Failed, Retrying)
                | (Failed, Resolved)
                | (Retrying, Failed)
                | (Retrying, Resolved)
                | (Retrying, PermanentlyFailed)
                // An operator can requeue a dead letter.
                | (PermanentlyFailed, Retrying)
                | (PermanentlyFailed, Resolved)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FailedEmailStatus::*;
        match self {
            Failed => vec![Retrying, Resolved],
            Retrying => vec![Failed, Resolved, PermanentlyFailed],
            PermanentlyFailed => vec![Retrying, Resolved],
            Resolved => vec![],
        }
    }
}

/// Context attached to a send so failures can be traced back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailMetadata {
    pub order_id: Option<OrderId>,
    pub user_id: Option<UserId>,
}

/// A delivery failure awaiting operator follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedEmailRecord {
    pub id: FailedEmailId,
    pub recipient: String,
    pub email_type: EmailType,
    pub subject: String,
    pub error: String,
    pub retry_count: i32,
    pub status: FailedEmailStatus,
    pub order_id: Option<OrderId>,
    pub user_id: Option<UserId>,
    pub created_at: Timestamp,
}

impl FailedEmailRecord {
    /// Record for a send whose retries are exhausted or whose error is not
    /// retryable.
    pub fn permanently_failed(
        message: &EmailMessage,
        error: impl Into<String>,
        attempts: u32,
        metadata: &EmailMetadata,
    ) -> Self {
        Self {
            id: FailedEmailId::new(),
            recipient: message.to.clone(),
            email_type: message.email_type,
            subject: message.subject.clone(),
            error: error.into(),
            retry_count: i32::try_from(attempts).unwrap_or(i32::MAX),
            status: FailedEmailStatus::PermanentlyFailed,
            order_id: metadata.order_id.clone(),
            user_id: metadata.user_id,
            created_at: Timestamp::now(),
        }
    }
}
