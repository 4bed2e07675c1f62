//! HTTP rendering of [`Error`].
//!
//! Every failure becomes `{error, message}` JSON with the status from
//! [`Error::status_code`]. Internal failures are logged and answered with a
//! generic message; outside production [`expose_internal_errors`] adds the
//! underlying detail under `detail`.

use crate::errors::Error;
use axum::{
    Json,
    extract::{
        Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code
    pub error: &'static str,
    /// Human-readable message
    pub message: String,
    /// Internal detail, only outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Detail of an internal error, carried on the response for the dev middleware.
#[derive(Debug, Clone)]
struct InternalDetail(String);

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_internal() {
            tracing::error!(error = %self, "Request failed with internal error");
            let body = ErrorBody {
                error: self.code(),
                message: INTERNAL_MESSAGE.to_string(),
                detail: None,
            };
            let mut response = (status, Json(body)).into_response();
            response
                .extensions_mut()
                .insert(InternalDetail(self.to_string()));
            return response;
        }

        if status.is_server_error() {
            tracing::warn!(error = %self, "Upstream failure");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
            detail: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Rewrites internal error responses to include their detail.
pub async fn expose_internal_errors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let Some(InternalDetail(detail)) = response.extensions_mut().remove::<InternalDetail>() else {
        return response;
    };

    let body = ErrorBody {
        error: "INTERNAL_ERROR",
        message: INTERNAL_MESSAGE.to_string(),
        detail: Some(detail),
    };
    (response.status(), Json(body)).into_response()
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}
