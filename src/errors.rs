//! Unified error type for the store backend.
//!
//! Every business-rule failure maps to one variant here; the API layer turns
//! variants into HTTP status codes via [`Error::status_code`].

use axum::http::StatusCode;
use thiserror::Error;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input
    #[error("{message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Duplicate entity or entity already in a terminal state
    #[error("{message}")]
    Conflict {
        /// Human-readable reason
        message: String,
    },

    /// Unknown email or wrong password. Both cases share this variant so the
    /// response never reveals which one happened.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, expired or tampered bearer token, or bad webhook signature
    #[error("{message}")]
    Unauthorized {
        /// Human-readable reason
        message: String,
    },

    /// Caller is authenticated but not allowed to do this
    #[error("{message}")]
    Forbidden {
        /// Human-readable reason
        message: String,
    },

    /// The store's plan does not allow more of a resource
    #[error("The {plan} plan allows at most {limit} {resource}")]
    PlanLimitReached {
        /// Plan name
        plan: String,
        /// Limited resource (e.g. "products")
        resource: &'static str,
        /// Maximum allowed
        limit: i32,
    },

    /// Entity does not exist or belongs to another store
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A variant does not have enough units for the requested quantity
    #[error("Insufficient stock for one or more products")]
    InsufficientStock {
        /// Variant that ran short
        variant_id: i64,
        /// Quantity that was requested
        requested: i32,
    },

    /// The payment gateway could not be reached or answered with an error
    #[error("Payment gateway error: {message}")]
    Gateway {
        /// Upstream failure description
        message: String,
    },

    /// Configuration problem detected at startup or at use
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Password hashing failure
    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    /// Token encoding failure
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unclassified internal failure
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable reason
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } | Self::PlanLimitReached { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Gateway { .. } => StatusCode::BAD_GATEWAY,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Password(_)
            | Self::Token(_)
            | Self::Io(_)
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code used in the `error` field of responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Conflict { .. } => "CONFLICT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::PlanLimitReached { .. } => "PLAN_LIMIT_REACHED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::Gateway { .. } => "GATEWAY_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Whether the error is an unclassified server-side failure whose detail
    /// must not reach clients in production.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error() && !matches!(self, Self::Gateway { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Gateway {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
