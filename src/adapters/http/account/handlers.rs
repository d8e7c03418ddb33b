//! HTTP handlers for account setup endpoints.

use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;
use secrecy::SecretString;

use crate::application::handlers::account::{CompleteAccountSetupCommand, VerifySetupTokenQuery};

use super::dto::{CompleteSetupRequest, CompleteSetupResponse, VerifyTokenParams, VerifyTokenResponse};
use crate::adapters::http::{ApiError, AppState};

/// GET /api/account/setup?token=
pub async fn verify_setup_token(
    State(state): State<AppState>,
    Query(params): Query<VerifyTokenParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .verify_token_handler
        .handle(VerifySetupTokenQuery {
            token: params.token,
        })
        .await?;

    Ok(Json(VerifyTokenResponse::from(result)))
}

/// POST /api/account/setup
pub async fn complete_setup(
    State(state): State<AppState>,
    Json(request): Json<CompleteSetupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .account_setup_handler
        .handle(CompleteAccountSetupCommand {
            token: request.token,
            password: SecretString::new(request.password),
        })
        .await?;

    Ok(Json(CompleteSetupResponse::from(result)))
}
