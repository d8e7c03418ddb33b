//! HTTP handlers for payment endpoints.

use axum::extract::{Form, Json, State};
use axum::response::{IntoResponse, Redirect};

use crate::application::handlers::payment::{
    HandlePaymentCallbackCommand, InitiateCheckoutCommand,
};

use super::dto::{CheckoutRequest, CheckoutResponse, GatewayCallbackForm};
use crate::adapters::http::{ApiError, AppState};

/// POST /api/payments/callback and /api/payments/cancel
///
/// A body that fails to parse is handled as a missing payload so the
/// browser still lands on the failure page.
pub async fn handle_callback(
    State(state): State<AppState>,
    form: Option<Form<GatewayCallbackForm>>,
) -> Redirect {
    let enc_resp = form.and_then(|Form(form)| form.enc_resp);
    let result = state
        .callback_handler
        .handle(HandlePaymentCallbackCommand { enc_resp })
        .await;

    Redirect::to(&result.redirect.to_url(&state.frontend_url))
}

/// POST /api/payments/checkout
pub async fn initiate_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .checkout_handler
        .handle(InitiateCheckoutCommand {
            plan_type: request.plan_type,
            user_id: request.user_id,
            billing_email: request.billing_email,
            billing_name: request.billing_name,
        })
        .await?;

    Ok(Json(CheckoutResponse::from(result)))
}
