//! Invoice entity - a recorded sale.
//!
//! An invoice is created together with its items in one transaction and only
//! ever moves from `completada` to `cancelada`. Totals are kept after
//! cancellation as historical record.

use super::enums::{InvoiceStatus, PaymentMethod};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Store that made the sale
    pub store_id: i64,
    /// User who rang up the sale
    pub user_id: i64,
    /// Customer name, the only required customer field
    pub customer_name: String,
    /// Customer identity document
    pub customer_document: Option<String>,
    /// Customer phone
    pub customer_phone: Option<String>,
    /// Customer address
    pub customer_address: Option<String>,
    /// Sum of line subtotals
    pub subtotal: f64,
    /// VAT charged on the subtotal
    pub tax: f64,
    /// `subtotal + tax`
    pub total: f64,
    /// How the customer paid
    pub payment_method: PaymentMethod,
    /// Lifecycle state
    pub status: InvoiceStatus,
    /// When the sale happened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice belongs to one store
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    /// One invoice has many line items
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    Items,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
