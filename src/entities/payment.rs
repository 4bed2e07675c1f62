//! Payment entity - a charge for a plan, usually settled through the gateway.
//!
//! Gateway metadata lives in typed columns: the billing period the payment
//! buys, the integrity signature sent to the checkout widget and the
//! gateway's transaction id once the webhook confirms it.

use super::enums::{BillingPeriod, PaymentStatus, PlanTier};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Paying store
    pub store_id: i64,
    /// Subscription created or paid by this payment
    pub subscription_id: Option<i64>,
    /// Amount in major currency units
    pub amount: f64,
    /// ISO currency code
    pub currency: String,
    /// Plan being paid for
    pub plan: PlanTier,
    /// Free-form label (e.g. "wompi")
    pub payment_method: String,
    /// Lifecycle state
    pub status: PaymentStatus,
    /// Reference shared with the gateway; unique
    #[sea_orm(unique)]
    pub reference: String,
    /// Billing period this payment buys
    pub billing_period: BillingPeriod,
    /// Integrity signature handed to the checkout widget
    pub integrity_signature: Option<String>,
    /// Gateway transaction id, known after confirmation
    pub external_transaction_id: Option<String>,
    /// When the payment intent was recorded
    pub created_at: DateTimeUtc,
    /// When the gateway confirmed the payment
    pub paid_at: Option<DateTimeUtc>,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one store
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
