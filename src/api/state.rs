//! Shared application state

use crate::config::AppConfig;
use crate::core::{token::TokenKeys, wompi::WompiClient};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Connection pool, built once in `main`
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    /// Session token keys
    pub tokens: TokenKeys,
    /// Gateway REST client
    pub wompi: WompiClient,
}

impl AppState {
    /// Builds the state from a connection and the loaded configuration.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            tokens: TokenKeys::new(&config.jwt_secret),
            wompi: WompiClient::new(&config.wompi),
            config: Arc::new(config),
            db,
        }
    }
}
