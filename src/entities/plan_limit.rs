//! Plan limits entity - price and resource caps of each subscription tier.
//! Seeded at startup from the plan catalog.

use super::enums::PlanTier;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plan limits database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plan_limits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tier these limits describe
    #[sea_orm(unique)]
    pub plan: PlanTier,
    /// Display name
    pub name: String,
    pub monthly_price: f64,
    pub annual_price: f64,
    /// `None` means unlimited
    pub max_products: Option<i32>,
    /// `None` means unlimited
    pub max_users: Option<i32>,
}

/// `PlanLimit` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
