//! Plan and subscription handlers

use crate::{
    api::{
        extract::{ApiJson, AuthUser},
        state::AppState,
    },
    core::{
        policy::Action,
        subscription::{self, ChangePlanInput, CurrentSubscription, PlanChange},
    },
    entities::{PaymentModel, PlanLimitModel, PlanTier},
    errors::Result,
};
use axum::extract::State;
use serde::Serialize;

/// Response of `POST /api/subscriptions/cancelar`
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub plan: PlanTier,
}

/// Public plan catalog.
pub async fn plans(State(state): State<AppState>) -> Result<ApiJson<Vec<PlanLimitModel>>> {
    subscription::list_plans(&state.db).await.map(ApiJson)
}

pub async fn current(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiJson<CurrentSubscription>> {
    user.require(Action::ManageBilling)?;
    subscription::current_subscription(&state.db, user.store_id)
        .await
        .map(ApiJson)
}

pub async fn change_plan(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<ChangePlanInput>,
) -> Result<ApiJson<PlanChange>> {
    user.require(Action::ManageBilling)?;
    subscription::change_plan(&state.db, user.store_id, input)
        .await
        .map(ApiJson)
}

pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiJson<Vec<PaymentModel>>> {
    user.require(Action::ManageBilling)?;
    subscription::payment_history(&state.db, user.store_id)
        .await
        .map(ApiJson)
}

pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiJson<CancelResponse>> {
    user.require(Action::ManageBilling)?;
    let plan = subscription::cancel_subscription(&state.db, user.store_id).await?;
    Ok(ApiJson(CancelResponse { plan }))
}
