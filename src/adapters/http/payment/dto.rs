//! Request and response bodies for the payment endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::payment::InitiateCheckoutResult;
use crate::domain::foundation::UserId;
use crate::domain::order::PlanType;

/// Form posted by the gateway to the callback and cancel URLs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayCallbackForm {
    /// Hex ciphertext of the gateway response.
    #[serde(rename = "encResp", default)]
    pub enc_resp: Option<String>,
}

/// Request to start a checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub plan_type: PlanType,
    /// Signed-in buyer, if any.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Required for guests.
    #[serde(default)]
    pub billing_email: Option<String>,
    #[serde(default)]
    pub billing_name: Option<String>,
}

/// Everything the browser needs to post the order to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    /// Gateway action URL the form is posted to.
    pub gateway_url: String,
    #[serde(rename = "encRequest")]
    pub enc_request: String,
    pub access_code: String,
}

impl From<InitiateCheckoutResult> for CheckoutResponse {
    fn from(result: InitiateCheckoutResult) -> Self {
        Self {
            order_id: result.order_id.to_string(),
            gateway_url: result.gateway_url,
            enc_request: result.enc_request,
            access_code: result.access_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::OrderId;
    use serde_json::json;

    #[test]
    fn checkout_request_accepts_guest_body() {
        let req: CheckoutRequest = serde_json::from_value(json!({
            "plan_type": "annual",
            "billing_email": "guest@example.com"
        }))
        .unwrap();
        assert_eq!(req.plan_type, PlanType::Annual);
        assert!(req.user_id.is_none());
    }

    #[test]
    fn checkout_request_rejects_unknown_plan() {
        let result: Result<CheckoutRequest, _> =
            serde_json::from_value(json!({ "plan_type": "lifetime" }));
        assert!(result.is_err());
    }

    #[test]
    fn checkout_response_uses_gateway_field_names() {
        let response = CheckoutResponse::from(InitiateCheckoutResult {
            order_id: OrderId::new("ORD_1").unwrap(),
            gateway_url: "https://gw.test/transaction".to_string(),
            enc_request: "abcd".to_string(),
            access_code: "AC1".to_string(),
        });
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["encRequest"], "abcd");
        assert_eq!(json["order_id"], "ORD_1");
    }
}
