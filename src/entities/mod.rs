//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod enums;
pub mod invoice;
pub mod invoice_item;
pub mod payment;
pub mod plan_limit;
pub mod product;
pub mod product_variant;
pub mod store;
pub mod store_member;
pub mod subscription;
pub mod user;

// Re-export specific types to avoid conflicts
pub use enums::{
    BillingPeriod, InvoiceStatus, PaymentMethod, PaymentStatus, PlanTier, Role, StoreStatus,
    SubscriptionStatus, UserStatus,
};
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use invoice_item::{
    Column as InvoiceItemColumn, Entity as InvoiceItem, Model as InvoiceItemModel,
};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use plan_limit::{Column as PlanLimitColumn, Entity as PlanLimit, Model as PlanLimitModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_variant::{
    Column as ProductVariantColumn, Entity as ProductVariant, Model as ProductVariantModel,
};
pub use store::{Column as StoreColumn, Entity as Store, Model as StoreModel};
pub use store_member::{
    Column as StoreMemberColumn, Entity as StoreMember, Model as StoreMemberModel,
};
pub use subscription::{
    Column as SubscriptionColumn, Entity as Subscription, Model as SubscriptionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
