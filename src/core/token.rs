//! Session tokens.
//!
//! Tokens are HS256 JWTs carrying the user, the store they act for, their
//! email and their role in that store. They expire after seven days.

use crate::entities::Role;
use crate::errors::{Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Lifetime of a session token.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Claims embedded in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    /// Store the session acts for
    pub store_id: i64,
    pub email: String,
    /// Role of the user in `store_id`
    pub role: Role,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Signing and verification keys derived from one shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Builds the key pair from the configured secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token for `user_id` acting as `role` in `store_id`.
    pub fn issue(&self, user_id: i64, store_id: i64, email: &str, role: Role) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            store_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(Into::into)
    }

    /// Verifies signature and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns [`Error::Unauthorized`] for expired, malformed or tampered tokens.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected session token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        Error::unauthorized("Token expired")
                    }
                    _ => Error::unauthorized("Invalid token"),
                }
            })
    }

    #[cfg(test)]
    pub(crate) fn issue_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding).map_err(Into::into)
    }
}
