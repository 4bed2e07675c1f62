//! Plan catalog loading from plans.toml
//!
//! The catalog lists the price and resource caps of each subscription tier.
//! It is seeded into the `plan_limits` table at startup; when no file is
//! present the built-in defaults are used.

use crate::entities::PlanTier;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire plans.toml file
#[derive(Debug, Deserialize)]
pub struct PlanCatalog {
    /// One entry per tier
    pub plans: Vec<PlanConfig>,
}

/// Configuration for a single plan
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PlanConfig {
    /// Tier identifier (free, basic, premium, enterprise)
    pub plan: PlanTier,
    /// Display name
    pub name: String,
    /// Price of one month
    pub monthly_price: f64,
    /// Price of one year
    pub annual_price: f64,
    /// Maximum active products; absent means unlimited
    pub max_products: Option<i32>,
    /// Maximum users; absent means unlimited
    pub max_users: Option<i32>,
}

impl PlanCatalog {
    /// Built-in catalog used when no plans.toml is available.
    #[must_use]
    pub fn builtin() -> Self {
        let plan = |plan, name: &str, monthly: f64, products, users| PlanConfig {
            plan,
            name: name.to_string(),
            monthly_price: monthly,
            annual_price: monthly * 10.0,
            max_products: products,
            max_users: users,
        };
        Self {
            plans: vec![
                plan(PlanTier::Free, "Free", 0.0, Some(50), Some(1)),
                plan(PlanTier::Basic, "Basic", 29.0, Some(500), Some(3)),
                plan(PlanTier::Premium, "Premium", 79.0, None, Some(10)),
                plan(PlanTier::Enterprise, "Enterprise", 199.0, None, None),
            ],
        }
    }

    /// Checks that every tier appears exactly once with sane prices.
    pub fn validate(&self) -> Result<()> {
        for tier in [
            PlanTier::Free,
            PlanTier::Basic,
            PlanTier::Premium,
            PlanTier::Enterprise,
        ] {
            let count = self.plans.iter().filter(|p| p.plan == tier).count();
            if count != 1 {
                return Err(Error::Config {
                    message: format!(
                        "Plan '{}' must appear exactly once in the catalog (found {count})",
                        tier.as_str()
                    ),
                });
            }
        }

        if let Some(bad) = self.plans.iter().find(|p| {
            !p.monthly_price.is_finite()
                || !p.annual_price.is_finite()
                || p.monthly_price < 0.0
                || p.annual_price < 0.0
        }) {
            return Err(Error::Config {
                message: format!("Plan '{}' has an invalid price", bad.plan.as_str()),
            });
        }

        Ok(())
    }
}

/// Loads the plan catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A tier is missing, duplicated or has a negative price
pub fn load_plans<P: AsRef<Path>>(path: P) -> Result<PlanCatalog> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read plans file: {e}"),
    })?;

    let catalog: PlanCatalog = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse plans.toml: {e}"),
    })?;
    catalog.validate()?;
    Ok(catalog)
}

/// Loads the catalog from `path` if the file exists, otherwise the built-in one.
pub fn load_plans_or_builtin<P: AsRef<Path>>(path: P) -> Result<PlanCatalog> {
    if path.as_ref().exists() {
        load_plans(path)
    } else {
        tracing::info!(
            path = %path.as_ref().display(),
            "Plan catalog file not found, using built-in plans"
        );
        Ok(PlanCatalog::builtin())
    }
}
