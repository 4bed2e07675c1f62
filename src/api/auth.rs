//! Auth handlers

use crate::{
    api::{
        extract::{ApiJson, AuthUser},
        state::AppState,
    },
    core::auth::{self, AuthSession, LoginInput, Profile, RegisterInput},
    errors::Result,
};
use axum::{extract::State, http::StatusCode};

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, ApiJson<AuthSession>)> {
    let session = auth::register(&state.db, &state.tokens, state.config.bcrypt_cost, input).await?;
    Ok((StatusCode::CREATED, ApiJson(session)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<ApiJson<AuthSession>> {
    auth::login(&state.db, &state.tokens, input).await.map(ApiJson)
}

/// `GET /api/auth/profile`
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> Result<ApiJson<Profile>> {
    auth::get_profile(&state.db, user.user_id, user.store_id)
        .await
        .map(ApiJson)
}
