//! Browser redirect issued at the end of every callback.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::domain::foundation::OrderId;
use crate::domain::order::PlanType;

/// Characters left unescaped in query values (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Maximum length of a reason shown to the user.
pub const MAX_REASON_LEN: usize = 120;

/// Where the paying user is sent once the callback is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRedirect {
    Success {
        order_id: OrderId,
        tracking_id: String,
        plan_type: Option<PlanType>,
    },
    Failure {
        order_id: Option<OrderId>,
        reason: String,
        plan_type: Option<PlanType>,
    },
}

impl PaymentRedirect {
    pub fn success(order_id: OrderId, tracking_id: impl Into<String>, plan_type: Option<PlanType>) -> Self {
        PaymentRedirect::Success {
            order_id,
            tracking_id: tracking_id.into(),
            plan_type,
        }
    }

    /// Builds a failure redirect, sanitizing `reason`.
    pub fn failure(order_id: Option<OrderId>, reason: &str, plan_type: Option<PlanType>) -> Self {
        PaymentRedirect::Failure {
            order_id,
            reason: sanitize_reason(reason),
            plan_type,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentRedirect::Success { .. })
    }

    /// Renders the absolute redirect URL under `frontend_url`.
    pub fn to_url(&self, frontend_url: &str) -> String {
        let base = frontend_url.trim_end_matches('/');
        let plan = |p: &Option<PlanType>| p.map(|p| p.as_str()).unwrap_or_default();

        match self {
            PaymentRedirect::Success {
                order_id,
                tracking_id,
                plan_type,
            } => format!(
                "{}/payment/success?order_id={}&tracking_id={}&plan_type={}",
                base,
                encode(order_id.as_str()),
                encode(tracking_id),
                encode(plan(plan_type)),
            ),
            PaymentRedirect::Failure {
                order_id,
                reason,
                plan_type,
            } => format!(
                "{}/payment/failure?order_id={}&reason={}&plan_type={}",
                base,
                encode(order_id.as_ref().map(OrderId::as_str).unwrap_or_default()),
                encode(reason),
                encode(plan(plan_type)),
            ),
        }
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Strips control characters, trims, and caps the length of a
/// user-visible failure reason.
pub fn sanitize_reason(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_REASON_LEN)
        .collect();

    if cleaned.is_empty() {
        "payment_failed".to_string()
    } else {
        cleaned
    }
}
