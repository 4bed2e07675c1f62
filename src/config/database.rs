//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. The plan catalog is seeded here as well.

use crate::config::plans::PlanCatalog;
use crate::entities::{
    Invoice, InvoiceItem, Payment, PlanLimit, Product, ProductVariant, Store, StoreMember,
    Subscription, User, plan_limit,
};
use crate::errors::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Schema, Set,
};

/// Establishes a connection to the database at `database_url`.
///
/// `SQLite` URLs are the default; a `postgres://` URL works as well.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Creates all tables from the entity definitions, skipping existing ones.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    // Parents before children so foreign keys resolve
    create_table(db, &schema, Store).await?;
    create_table(db, &schema, User).await?;
    create_table(db, &schema, StoreMember).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, ProductVariant).await?;
    create_table(db, &schema, Invoice).await?;
    create_table(db, &schema, InvoiceItem).await?;
    create_table(db, &schema, Subscription).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, PlanLimit).await?;

    Ok(())
}

/// Writes the plan catalog into `plan_limits`, updating tiers that already exist.
///
/// Returns the number of tiers written.
pub async fn seed_plan_limits(db: &DatabaseConnection, catalog: &PlanCatalog) -> Result<usize> {
    for plan in &catalog.plans {
        let existing = PlanLimit::find()
            .filter(plan_limit::Column::Plan.eq(plan.plan))
            .one(db)
            .await?;

        let mut row = existing.map_or_else(
            || plan_limit::ActiveModel {
                plan: Set(plan.plan),
                ..Default::default()
            },
            Into::into,
        );
        row.name = Set(plan.name.clone());
        row.monthly_price = Set(plan.monthly_price);
        row.annual_price = Set(plan.annual_price);
        row.max_products = Set(plan.max_products);
        row.max_users = Set(plan.max_users);
        row.save(db).await?;
    }

    tracing::debug!(count = catalog.plans.len(), "Plan limits seeded");
    Ok(catalog.plans.len())
}
