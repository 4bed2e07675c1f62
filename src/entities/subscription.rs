//! Subscription entity - a store's paid or free plan period.
//!
//! At most one row per store is `activa`; the billing service cancels the
//! previous one in the same transaction that creates a new one.

use super::enums::{BillingPeriod, PlanTier, SubscriptionStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub store_id: i64,
    /// Plan granted by this subscription
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
    pub started_at: DateTimeUtc,
    /// Start plus one billing period
    pub next_payment_at: DateTimeUtc,
    /// Set when the subscription is cancelled or replaced
    pub ended_at: Option<DateTimeUtc>,
    /// Price of one billing period
    pub amount: f64,
    pub period: BillingPeriod,
    /// Free-form label (e.g. "wompi", "tarjeta")
    pub payment_method: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
