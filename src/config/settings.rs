//! Application settings loaded from environment variables.
//!
//! `main` calls [`AppConfig::from_env`] after `dotenvy` has loaded `.env`.
//! Parsing goes through a lookup function so tests never touch the process
//! environment.

use crate::errors::{Error, Result};
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/shoe_store.sqlite?mode=rwc";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_WOMPI_API_URL: &str = "https://production.wompi.co/v1";
const DEFAULT_PLANS_PATH: &str = "plans.toml";

/// Deployment environment; controls whether internal error detail is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local or staging deployments
    Development,
    /// Public deployment
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Whether this is a production deployment.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Wompi gateway credentials
#[derive(Debug, Clone)]
pub struct WompiConfig {
    /// REST base URL
    pub api_url: String,
    /// Key handed to the checkout widget
    pub public_key: String,
    /// Key for server-to-server calls
    pub private_key: String,
    /// Secret for checkout integrity signatures
    pub integrity_secret: String,
    /// Secret for webhook event signatures
    pub events_secret: String,
    /// Charge currency
    pub currency: String,
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// sea-orm connection string
    pub database_url: String,
    pub environment: Environment,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    /// Client origin, used for CORS and payment redirects
    pub frontend_url: String,
    pub wompi: WompiConfig,
    /// Location of the plan catalog
    pub plans_path: String,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `JWT_SECRET` is missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_addr = get("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|e| Error::Config {
                message: format!("Invalid BIND_ADDR: {e}"),
            })?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config {
                message: "JWT_SECRET must be set".to_string(),
            })?;

        let bcrypt_cost = get("BCRYPT_COST", "10")
            .parse::<u32>()
            .ok()
            .filter(|cost| (4..=31).contains(cost))
            .ok_or_else(|| Error::Config {
                message: "BCRYPT_COST must be an integer between 4 and 31".to_string(),
            })?;

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            environment: Environment::parse(&get("APP_ENV", "development")),
            jwt_secret,
            bcrypt_cost,
            frontend_url: get("FRONTEND_URL", DEFAULT_FRONTEND_URL)
                .trim_end_matches('/')
                .to_string(),
            wompi: WompiConfig {
                api_url: get("WOMPI_API_URL", DEFAULT_WOMPI_API_URL)
                    .trim_end_matches('/')
                    .to_string(),
                public_key: get("WOMPI_PUBLIC_KEY", ""),
                private_key: get("WOMPI_PRIVATE_KEY", ""),
                integrity_secret: get("WOMPI_INTEGRITY_SECRET", ""),
                events_secret: get("WOMPI_EVENTS_SECRET", ""),
                currency: get("WOMPI_CURRENCY", "COP"),
            },
            plans_path: get("PLANS_CONFIG", DEFAULT_PLANS_PATH),
        })
    }

    /// Origins allowed by CORS: the local dev servers plus the configured frontend.
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = ["5173", "5174", "5175"]
            .iter()
            .map(|port| format!("http://localhost:{port}"))
            .collect();
        if !origins.contains(&self.frontend_url) {
            origins.push(self.frontend_url.clone());
        }
        origins
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.frontend_url, "http://localhost:5173");
        assert_eq!(config.wompi.currency, "COP");
        assert_eq!(config.wompi.api_url, "https://production.wompi.co/v1");
        assert_eq!(config.plans_path, "plans.toml");
    }

    #[test]
    fn test_jwt_secret_is_required() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "  ")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "x"),
            ("APP_ENV", "Production"),
            ("BCRYPT_COST", "12"),
            ("FRONTEND_URL", "https://shop.example.com/"),
        ]))
        .unwrap();
        assert!(config.environment.is_production());
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.frontend_url, "https://shop.example.com");

        let result =
            AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "x"), ("BCRYPT_COST", "99")]));
        assert!(matches!(result, Err(Error::Config { .. })));

        let result =
            AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "x"), ("BIND_ADDR", "nope")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_allowed_origins() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "x"),
            ("FRONTEND_URL", "https://shop.example.com"),
        ]))
        .unwrap();
        let origins = config.allowed_origins();
        assert_eq!(origins.len(), 4);
        assert!(origins.contains(&"http://localhost:5174".to_string()));
        assert!(origins.contains(&"https://shop.example.com".to_string()));

        let local = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "x")])).unwrap();
        assert_eq!(local.allowed_origins().len(), 3);
    }
}
