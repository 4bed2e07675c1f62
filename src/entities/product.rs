//! Product entity - a shoe model sold by a store.
//!
//! Stock lives on the size/color variants, not on the product itself.
//! Products are soft deleted so past invoices keep resolving their names.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning store
    pub store_id: i64,
    /// Name shown at the point of sale (e.g., "Runner Pro")
    pub name: String,
    /// Brand (e.g., "Nike")
    pub brand: String,
    /// Model reference
    pub model: String,
    /// Barcode printed on the box
    pub barcode: Option<String>,
    /// Base sale price
    pub sale_price: f64,
    /// Image location
    pub image_url: Option<String>,
    /// Soft delete flag - if true, product is hidden but data is preserved
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one store
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    /// One product has many size/color variants
    #[sea_orm(has_many = "super::product_variant::Entity")]
    Variants,
    /// Invoice lines that sold this product
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    InvoiceItems,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
