//! Errors on the payment callback path.

use thiserror::Error;

use super::CryptoError;
use crate::domain::foundation::{DomainError, OrderId, ValidationError};

/// Why a callback could not be processed.
///
/// Every variant still ends in a redirect; `redirect_reason` picks the
/// user-facing code so internal detail never leaks to the browser.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("callback is missing the encResp field")]
    MissingPayload,

    #[error("could not decrypt gateway response: {0}")]
    Crypto(#[from] CryptoError),

    #[error("gateway response is malformed: {0}")]
    InvalidResponse(#[from] ValidationError),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("storage failure: {0}")]
    Storage(#[from] DomainError),
}

impl CallbackError {
    /// Reason code placed in the failure redirect.
    pub fn redirect_reason(&self) -> &'static str {
        match self {
            CallbackError::Crypto(_) => "payment_verification_failed",
            CallbackError::MissingPayload | CallbackError::InvalidResponse(_) => {
                "invalid_response"
            }
            CallbackError::OrderNotFound(_) => "order_not_found",
            CallbackError::Storage(_) => "processing_error",
        }
    }
}
