//! JSON error responses for the API endpoints.
//!
//! The callback endpoints never use these: they always redirect.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::handlers::account::AccountSetupError;
use crate::application::handlers::payment::CheckoutError;
use crate::application::services::SetupTokenError;
use crate::ports::IdentityError;

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// API error carrying the status and body to render.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, body: ErrorResponse) -> Self {
        Self { status, body }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("INTERNAL_ERROR", "Internal server error"),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_code(&self) -> &str {
        &self.body.error_code
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match &err {
            CheckoutError::MissingBillingEmail => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("MISSING_BILLING_EMAIL", err.to_string()),
            ),
            CheckoutError::Validation(inner) => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_FAILED", inner.to_string()),
            ),
            CheckoutError::Crypto(inner) => {
                tracing::error!(error = %inner, "Failed to encrypt checkout request");
                Self::internal()
            }
            CheckoutError::Storage(inner) => {
                tracing::error!(error = %inner, "Failed to store pending order");
                Self::internal()
            }
        }
    }
}

impl From<SetupTokenError> for ApiError {
    fn from(err: SetupTokenError) -> Self {
        match err {
            SetupTokenError::Invalid(reason) => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details(
                    "INVALID_TOKEN",
                    "This setup link is invalid or has expired",
                    serde_json::json!({ "reason": reason.as_str() }),
                ),
            ),
            SetupTokenError::Storage(inner) => {
                tracing::error!(error = %inner, "Failed to read setup token");
                Self::internal()
            }
        }
    }
}

impl From<AccountSetupError> for ApiError {
    fn from(err: AccountSetupError) -> Self {
        match &err {
            AccountSetupError::PasswordTooShort { min } => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details(
                    "PASSWORD_TOO_SHORT",
                    err.to_string(),
                    serde_json::json!({ "min_length": *min }),
                ),
            ),
            AccountSetupError::InvalidToken(reason) => {
                SetupTokenError::Invalid(*reason).into()
            }
            AccountSetupError::Identity(IdentityError::Rejected(detail)) => {
                tracing::warn!(error = %detail, "Identity backend rejected password update");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("PASSWORD_REJECTED", "The password was not accepted"),
                )
            }
            AccountSetupError::Identity(inner) => {
                tracing::error!(error = %inner, "Failed to update identity credentials");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::new("IDENTITY_UNAVAILABLE", "Please try again shortly"),
                )
            }
            AccountSetupError::Storage(inner) => {
                tracing::error!(error = %inner, "Failed to activate account");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DomainError;
    use crate::domain::setup_token::TokenInvalidReason;

    #[test]
    fn missing_billing_email_is_bad_request() {
        let err = ApiError::from(CheckoutError::MissingBillingEmail);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "MISSING_BILLING_EMAIL");
    }

    #[test]
    fn storage_errors_hide_their_message() {
        let err = ApiError::from(CheckoutError::Storage(DomainError::database(
            "connection refused to 10.0.0.5",
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.message, "Internal server error");
    }

    #[test]
    fn invalid_token_reports_reason() {
        let err = ApiError::from(SetupTokenError::Invalid(TokenInvalidReason::Expired));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body.details,
            Some(serde_json::json!({ "reason": "expired" }))
        );
    }

    #[test]
    fn account_setup_token_errors_match_verify_errors() {
        let err = ApiError::from(AccountSetupError::InvalidToken(TokenInvalidReason::AlreadyUsed));
        assert_eq!(err.error_code(), "INVALID_TOKEN");
    }

    #[test]
    fn identity_outage_is_bad_gateway() {
        let err = ApiError::from(AccountSetupError::Identity(IdentityError::Unavailable(
            "503".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn error_response_skips_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("X", "y")).unwrap();
        assert!(json.get("details").is_none());
    }
}
