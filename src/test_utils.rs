//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::{WompiConfig, database, plans::PlanCatalog},
    core::token::TokenKeys,
    entities::{
        Invoice, PlanLimit, PlanTier, Role, StoreStatus, UserStatus, invoice, plan_limit, product,
        product_variant, store, store_member, user,
    },
    errors::{Error, Result},
};
use chrono::{Duration, Months, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// bcrypt cost used by tests; the minimum the library accepts.
pub const TEST_BCRYPT_COST: u32 = 4;
/// Password of every user created by these helpers.
pub const TEST_PASSWORD: &str = "secret123";
/// Secret of [`test_keys`].
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Creates an in-memory `SQLite` database with all tables initialized and the
/// built-in plan catalog seeded.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    database::seed_plan_limits(&db, &PlanCatalog::builtin()).await?;
    Ok(db)
}

/// Token keys signed with [`TEST_JWT_SECRET`].
#[must_use]
pub fn test_keys() -> TokenKeys {
    TokenKeys::new(TEST_JWT_SECRET)
}

/// Gateway credentials for tests.
#[must_use]
pub fn test_wompi_config() -> WompiConfig {
    WompiConfig {
        api_url: "http://127.0.0.1:9/v1".to_string(),
        public_key: "pub_test_key".to_string(),
        private_key: "prv_test_key".to_string(),
        integrity_secret: "test_integrity".to_string(),
        events_secret: "test_events".to_string(),
        currency: "COP".to_string(),
    }
}

/// Creates an active user with [`TEST_PASSWORD`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
) -> Result<user::Model> {
    user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(bcrypt::hash(TEST_PASSWORD, TEST_BCRYPT_COST)?),
        phone: Set(None),
        status: Set(UserStatus::Activo),
        last_login_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a store on the free plan with an owner.
/// Returns (store, owner).
///
/// # Defaults
/// * owner email: `owner@{slug}.test` where slug is the lowercase store name
pub async fn create_test_store(
    db: &DatabaseConnection,
    name: &str,
) -> Result<(store::Model, user::Model)> {
    let now = Utc::now();
    let store = store::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("store@{}.test", slug(name))),
        phone: Set(None),
        plan: Set(PlanTier::Free),
        status: Set(StoreStatus::Activo),
        trial_ends_at: Set(now.checked_add_months(Months::new(3))),
        last_payment_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let owner = create_test_member(db, store.id, &format!("owner@{}.test", slug(name)), Role::Owner)
        .await?;
    Ok((store, owner))
}

/// Creates a user holding `role` in `store_id`.
pub async fn create_test_member(
    db: &DatabaseConnection,
    store_id: i64,
    email: &str,
    role: Role,
) -> Result<user::Model> {
    let user = create_test_user(db, &format!("{role:?} {store_id}"), email).await?;
    store_member::ActiveModel {
        user_id: Set(user.id),
        store_id: Set(store_id),
        role: Set(role),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(user)
}

/// Creates a product priced 100.0 with one variant (size "42", color "Negro").
/// Returns (product, variant).
pub async fn create_test_product(
    db: &DatabaseConnection,
    store_id: i64,
    name: &str,
    stock: i32,
) -> Result<(product::Model, product_variant::Model)> {
    let now = Utc::now();
    let product = product::ActiveModel {
        store_id: Set(store_id),
        name: Set(name.to_string()),
        brand: Set("Test Brand".to_string()),
        model: Set(format!("{name}-M1")),
        barcode: Set(Some(format!("770{store_id}{}", name.len()))),
        sale_price: Set(100.0),
        image_url: Set(None),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let variant = create_test_variant(db, product.id, "42", stock).await?;
    Ok((product, variant))
}

/// Adds a variant of color "Negro" to a product.
pub async fn create_test_variant(
    db: &DatabaseConnection,
    product_id: i64,
    size: &str,
    stock: i32,
) -> Result<product_variant::Model> {
    product_variant::ActiveModel {
        product_id: Set(product_id),
        size: Set(size.to_string()),
        color: Set("Negro".to_string()),
        stock: Set(stock),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Moves an invoice's creation time `days` days into the past.
pub async fn backdate_invoice(db: &DatabaseConnection, invoice_id: i64, days: i64) -> Result<()> {
    let invoice = Invoice::find_by_id(invoice_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;
    let mut active: invoice::ActiveModel = invoice.into();
    active.created_at = Set(Utc::now() - Duration::days(days));
    active.update(db).await?;
    Ok(())
}

/// Overrides the product cap of a plan.
pub async fn set_plan_product_limit(
    db: &DatabaseConnection,
    plan: PlanTier,
    max_products: Option<i32>,
) -> Result<()> {
    let row = PlanLimit::find()
        .filter(plan_limit::Column::Plan.eq(plan))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Plan", plan.as_str()))?;
    let mut active: plan_limit::ActiveModel = row.into();
    active.max_products = Set(max_products);
    active.update(db).await?;
    Ok(())
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
