//! Decoded gateway callback payload.

use std::collections::HashMap;

use serde::Serialize;

use super::{decrypt, parse_fields, CallbackError};
use crate::domain::foundation::{OrderId, UserId, ValidationError};
use crate::domain::order::PlanType;

/// The fields the gateway posts back after a payment attempt.
///
/// Absent fields become empty strings so the raw response can be stored
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayResponse {
    pub order_id: OrderId,
    pub tracking_id: String,
    pub bank_ref_no: String,
    pub order_status: String,
    pub failure_message: String,
    pub payment_mode: String,
    pub card_name: String,
    pub status_code: String,
    pub status_message: String,
    pub amount: String,
    pub currency: String,
    pub billing_email: String,
    pub merchant_param1: String,
    pub merchant_param2: String,
    pub merchant_param3: String,
}

impl GatewayResponse {
    /// Decrypts and parses an `encResp` value.
    pub fn decode(enc_resp: &str, working_key: &str) -> Result<Self, CallbackError> {
        let plaintext = decrypt(enc_resp, working_key)?;
        Ok(Self::from_fields(parse_fields(&plaintext))?)
    }

    /// Builds a response from parsed fields. Only `order_id` is required.
    pub fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, ValidationError> {
        let mut take = |key: &str| fields.remove(key).unwrap_or_default().trim().to_string();

        let order_id = OrderId::new(take("order_id"))?;

        Ok(Self {
            order_id,
            tracking_id: take("tracking_id"),
            bank_ref_no: take("bank_ref_no"),
            order_status: take("order_status"),
            failure_message: take("failure_message"),
            payment_mode: take("payment_mode"),
            card_name: take("card_name"),
            status_code: take("status_code"),
            status_message: take("status_message"),
            amount: take("amount"),
            currency: take("currency"),
            billing_email: take("billing_email"),
            merchant_param1: take("merchant_param1"),
            merchant_param2: take("merchant_param2"),
            merchant_param3: take("merchant_param3"),
        })
    }

    /// True only when the gateway reports `Success` (any ASCII case).
    pub fn is_success(&self) -> bool {
        self.order_status.eq_ignore_ascii_case("success")
    }

    /// Plan echoed back in `merchant_param1`, if recognised.
    pub fn plan_type(&self) -> Option<PlanType> {
        self.merchant_param1.parse().ok()
    }

    /// Owning user echoed back in `merchant_param2`, if it parses.
    pub fn user_hint(&self) -> Option<UserId> {
        self.merchant_param2.parse().ok()
    }

    pub fn billing_email(&self) -> Option<&str> {
        Some(self.billing_email.as_str()).filter(|email| !email.is_empty())
    }

    /// The most specific failure text the gateway gave us.
    ///
    /// Prefers `failure_message`, then `status_message`, then the raw
    /// `order_status`, and finally a generic `payment_failed`.
    pub fn failure_reason(&self) -> &str {
        [
            self.failure_message.as_str(),
            self.status_message.as_str(),
            self.order_status.as_str(),
        ]
        .into_iter()
        .find(|text| !text.is_empty())
        .unwrap_or("payment_failed")
    }

    /// The response as a JSON blob for storage on the order.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
