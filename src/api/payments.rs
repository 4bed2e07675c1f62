//! Gateway checkout and webhook handlers

use crate::{
    api::{
        extract::{ApiJson, ApiPath, AuthUser},
        state::AppState,
    },
    core::{
        payment::{self, PaymentIntent, PaymentIntentInput, WebhookOutcome},
        policy::Action,
        wompi,
    },
    errors::Result,
};
use axum::{body::Bytes, extract::State, http::HeaderMap};

pub async fn create_intent(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<PaymentIntentInput>,
) -> Result<ApiJson<PaymentIntent>> {
    user.require(Action::ManageBilling)?;
    payment::create_payment_intent(
        &state.db,
        &state.config.wompi,
        &state.config.frontend_url,
        user.store_id,
        &user.email,
        input,
    )
    .await
    .map(ApiJson)
}

pub async fn transaction(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(transaction_id): ApiPath<String>,
) -> Result<ApiJson<serde_json::Value>> {
    user.require(Action::ManageBilling)?;
    payment::transaction_status(&state.db, &state.wompi, user.store_id, &transaction_id)
        .await
        .map(ApiJson)
}

/// Unauthenticated; trust comes from the event signature over the raw body.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ApiJson<WebhookOutcome>> {
    let signature = headers
        .get(wompi::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    payment::handle_webhook(
        &state.db,
        &state.config.wompi.events_secret,
        &body,
        signature,
    )
    .await
    .map(ApiJson)
}
