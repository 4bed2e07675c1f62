//! Store entity - the tenant root.
//!
//! Every other tenant-owned row carries a `store_id` pointing here.

use super::enums::{PlanTier, StoreStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Store database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    /// Unique identifier for the store
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Commercial name
    pub name: String,
    /// Contact email (the owner's at registration)
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Current subscription tier
    pub plan: PlanTier,
    /// Suspended stores cannot sign in
    pub status: StoreStatus,
    /// End of the free trial granted at registration
    pub trial_ends_at: Option<DateTimeUtc>,
    /// Last confirmed gateway payment
    pub last_payment_at: Option<DateTimeUtc>,
    /// When the store was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Store and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Users holding a role in this store
    #[sea_orm(has_many = "super::store_member::Entity")]
    Members,
    /// Catalog of the store
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    /// Sales of the store
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::store_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
