//! Request and response bodies for the account setup endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::application::handlers::account::{
    CompleteAccountSetupResult, VerifySetupTokenResult,
};

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTokenParams {
    #[serde(default)]
    pub token: String,
}

/// A valid setup link.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub email: String,
    /// ISO 8601.
    pub expires_at: String,
}

impl From<VerifySetupTokenResult> for VerifyTokenResponse {
    fn from(result: VerifySetupTokenResult) -> Self {
        Self {
            valid: true,
            email: result.email,
            expires_at: result.expires_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Password submission from the setup page.
#[derive(Clone, Deserialize)]
pub struct CompleteSetupRequest {
    pub token: String,
    pub password: String,
}

impl fmt::Debug for CompleteSetupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompleteSetupRequest")
            .field("token", &"[redacted]")
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteSetupResponse {
    pub user_id: String,
    pub email: String,
}

impl From<CompleteAccountSetupResult> for CompleteSetupResponse {
    fn from(result: CompleteAccountSetupResult) -> Self {
        Self {
            user_id: result.user_id.to_string(),
            email: result.email,
        }
    }
}
