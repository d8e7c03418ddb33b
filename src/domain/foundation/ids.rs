//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Maximum order id length accepted by the gateway.
const MAX_ORDER_ID_LEN: usize = 30;

/// User identifier.
///
/// Shared between the identity store and the profile store: a profile row
/// uses the same id as the identity it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random UserId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a UserId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Order identifier.
///
/// Generated by us at checkout and echoed back by the payment gateway, so it
/// is a string rather than a UUID: it must fit the gateway's alphanumeric
/// order id field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates an OrderId, returning error if empty or not gateway-safe.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::empty_field("order_id"));
        }
        if id.len() > MAX_ORDER_ID_LEN {
            return Err(ValidationError::invalid_format(
                "order_id",
                format!("must be at most {} characters", MAX_ORDER_ID_LEN),
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "order_id",
                "only letters, digits, '_' and '-' are allowed",
            ));
        }
        Ok(Self(id.to_string()))
    }

    /// Generates a fresh order id of the form `ORD_<unix secs>_<8 hex>`.
    pub fn generate() -> Self {
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!(
            "ORD_{}_{}",
            chrono::Utc::now().timestamp(),
            suffix.to_uppercase()
        ))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a failed email record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailedEmailId(Uuid);

impl FailedEmailId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FailedEmailId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FailedEmailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
