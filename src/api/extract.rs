//! Request extractors: the authenticated caller and JSON/path/query wrappers
//! whose rejections render as [`Error`].

use crate::{
    api::state::AppState,
    core::policy::{self, Action},
    entities::Role,
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query},
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The caller, decoded from the bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    /// Store every query is scoped to
    pub store_id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Fails with [`Error::Forbidden`] unless the caller's role allows `action`.
    pub fn require(&self, action: Action) -> Result<()> {
        policy::authorize(self.role, action).inspect_err(|_| {
            tracing::debug!(user_id = self.user_id, role = ?self.role, ?action, "Action denied");
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)
            .ok_or_else(|| Error::unauthorized("Missing authentication token"))?;
        let claims = state.tokens.validate(token)?;
        Ok(Self {
            user_id: claims.sub,
            store_id: claims.store_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// JSON body extractor and response
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameters extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);
