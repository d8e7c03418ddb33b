//! Purchase conversion events for ad attribution.
//!
//! Identifiers that could identify a person are SHA-256 hashed here, before
//! any adapter sees them.

use sha2::{Digest, Sha256};

use crate::domain::foundation::{OrderId, Timestamp, UserId};
use crate::domain::order::{Order, PlanType};

/// A completed purchase, ready to report.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseEvent {
    /// Deduplication key on the analytics side.
    pub event_id: OrderId,
    pub hashed_email: Option<String>,
    pub hashed_external_id: Option<String>,
    pub value: f64,
    pub currency: String,
    pub plan: PlanType,
    pub event_time: Timestamp,
    pub event_source_url: Option<String>,
}

impl PurchaseEvent {
    /// Builds the event for a paid order.
    pub fn from_order(order: &Order, email: Option<&str>, user_id: Option<UserId>) -> Self {
        Self {
            event_id: order.id.clone(),
            hashed_email: email.and_then(hash_email),
            hashed_external_id: user_id.map(|id| sha256_hex(&id.to_string())),
            value: order.amount_major(),
            currency: order.currency.clone(),
            plan: order.plan_type,
            event_time: Timestamp::now(),
            event_source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.event_source_url = Some(url.into());
        self
    }
}

/// Trims and lowercases before hashing. Empty input hashes to nothing.
pub fn hash_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(sha256_hex(&normalized))
    }
}

fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_before_hashing() {
        assert_eq!(hash_email("  Buyer@Example.COM "), hash_email("buyer@example.com"));
        assert_eq!(
            hash_email("test@example.com").unwrap(),
            "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b"
        );
    }

    #[test]
    fn blank_email_is_not_hashed() {
        assert_eq!(hash_email("   "), None);
    }

    #[test]
    fn event_carries_order_value_and_hashed_ids() {
        let order = Order::new_pending(
            OrderId::new("ORD_7").unwrap(),
            49_900,
            "INR",
            PlanType::Single,
            None,
            None,
        )
        .unwrap();
        let user = UserId::new();

        let event = PurchaseEvent::from_order(&order, Some("G@x.io"), Some(user));

        assert_eq!(event.event_id.as_str(), "ORD_7");
        assert!((event.value - 499.0).abs() < f64::EPSILON);
        assert_eq!(event.currency, "INR");
        assert_eq!(event.hashed_email, hash_email("g@x.io"));
        let external = event.hashed_external_id.unwrap();
        assert_eq!(external.len(), 64);
        assert_ne!(external, user.to_string());
    }
}
