//! Email provider port.

use crate::domain::email::EmailMessage;
use async_trait::async_trait;
use thiserror::Error;

/// Provider acknowledgement for an accepted email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailReceipt {
    pub provider_id: Option<String>,
}

/// Why a single send attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailDeliveryError {
    #[error("email provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("email provider request timed out")]
    Timeout,

    #[error("network error talking to email provider: {0}")]
    Network(String),

    #[error("email request could not be built: {0}")]
    InvalidRequest(String),
}

impl EmailDeliveryError {
    /// Transient failures are worth retrying: 5xx, 429, network errors and
    /// timeouts. Every other 4xx is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            EmailDeliveryError::Http { status, .. } => *status >= 500 || *status == 429,
            EmailDeliveryError::Timeout | EmailDeliveryError::Network(_) => true,
            EmailDeliveryError::InvalidRequest(_) => false,
        }
    }
}

/// Port for a transactional email API.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// One delivery attempt. Any 2xx counts as accepted.
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, EmailDeliveryError>;
}
