/// Database connection, schema creation and plan seeding
pub mod database;

/// Plan catalog loading from plans.toml
pub mod plans;

/// Application settings from environment variables
pub mod settings;

pub use settings::{AppConfig, Environment, WompiConfig};
