//! Catalog business logic - products and their size/color variants.
//!
//! Every lookup is scoped to the caller's store. Products are soft deleted so
//! the invoices that sold them keep resolving; a deleted product behaves as
//! missing for every catalog operation.

use crate::{
    entities::{
        PlanLimit, Product, ProductVariant, Store, plan_limit, product, product_variant,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Editable product fields
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub brand: String,
    pub model: String,
    pub barcode: Option<String>,
    pub sale_price: f64,
    pub image_url: Option<String>,
}

/// A size/color combination with its stock
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInput {
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub stock: i32,
}

/// A product together with its variants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: product::Model,
    pub variants: Vec<product_variant::Model>,
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_product(input: &ProductInput) -> Result<()> {
    if input.name.trim().is_empty()
        || input.brand.trim().is_empty()
        || input.model.trim().is_empty()
    {
        return Err(Error::validation("Name, brand and model are required"));
    }
    if !input.sale_price.is_finite() || input.sale_price < 0.0 {
        return Err(Error::validation(
            "Sale price must be a non-negative number",
        ));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(Error::validation("Stock cannot be negative"));
    }
    Ok(())
}

fn validate_variant(input: &VariantInput) -> Result<()> {
    if input.size.trim().is_empty() || input.color.trim().is_empty() {
        return Err(Error::validation("Variant size and color are required"));
    }
    validate_stock(input.stock)
}

fn variant_model(product_id: i64, input: &VariantInput) -> product_variant::ActiveModel {
    product_variant::ActiveModel {
        product_id: Set(product_id),
        size: Set(input.size.trim().to_string()),
        color: Set(input.color.trim().to_string()),
        stock: Set(input.stock),
        ..Default::default()
    }
}

/// Finds an active product of `store_id`, failing with [`Error::NotFound`] otherwise.
pub async fn find_store_product<C>(db: &C, store_id: i64, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .filter(product::Column::StoreId.eq(store_id))
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))
}

/// Lists the store's active products with their variants, ordered by name.
pub async fn list_products(
    db: &DatabaseConnection,
    store_id: i64,
) -> Result<Vec<ProductWithVariants>> {
    let rows = Product::find()
        .filter(product::Column::StoreId.eq(store_id))
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id)
        .find_with_related(ProductVariant)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(product, variants)| ProductWithVariants { product, variants })
        .collect())
}

/// Retrieves one product of the store with its variants.
pub async fn get_product(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
) -> Result<ProductWithVariants> {
    let product = find_store_product(db, store_id, product_id).await?;
    let variants = product
        .find_related(ProductVariant)
        .order_by_asc(product_variant::Column::Id)
        .all(db)
        .await?;
    Ok(ProductWithVariants { product, variants })
}

/// Creates a product and its initial variants in one transaction.
///
/// # Errors
/// Returns an error if:
/// - Name, brand or model is blank, or the price is negative or not finite
/// - A variant has a blank size/color or negative stock
/// - The store's plan already holds its maximum number of products
/// - The database insert fails
pub async fn create_product(
    db: &DatabaseConnection,
    store_id: i64,
    input: ProductInput,
    variants: Vec<VariantInput>,
) -> Result<ProductWithVariants> {
    validate_product(&input)?;
    for variant in &variants {
        validate_variant(variant)?;
    }

    let txn = db.begin().await?;

    let store = Store::find_by_id(store_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Store", store_id))?;
    let limits = PlanLimit::find()
        .filter(plan_limit::Column::Plan.eq(store.plan))
        .one(&txn)
        .await?;

    if let Some(max_products) = limits.and_then(|l| l.max_products) {
        let active = Product::find()
            .filter(product::Column::StoreId.eq(store_id))
            .filter(product::Column::IsDeleted.eq(false))
            .count(&txn)
            .await?;
        if active >= u64::try_from(max_products).unwrap_or(0) {
            return Err(Error::PlanLimitReached {
                plan: store.plan.as_str().to_string(),
                resource: "products",
                limit: max_products,
            });
        }
    }

    let now = Utc::now();
    let product = product::ActiveModel {
        store_id: Set(store_id),
        name: Set(input.name.trim().to_string()),
        brand: Set(input.brand.trim().to_string()),
        model: Set(input.model.trim().to_string()),
        barcode: Set(optional(input.barcode)),
        sale_price: Set(input.sale_price),
        image_url: Set(optional(input.image_url)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut created = Vec::with_capacity(variants.len());
    for variant in &variants {
        created.push(variant_model(product.id, variant).insert(&txn).await?);
    }

    txn.commit().await?;

    tracing::info!(
        store_id,
        product_id = product.id,
        variants = created.len(),
        "Product created"
    );
    Ok(ProductWithVariants {
        product,
        variants: created,
    })
}

/// Updates the editable fields of a product.
pub async fn update_product(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
    input: ProductInput,
) -> Result<product::Model> {
    validate_product(&input)?;
    let product = find_store_product(db, store_id, product_id).await?;

    let mut active: product::ActiveModel = product.into();
    active.name = Set(input.name.trim().to_string());
    active.brand = Set(input.brand.trim().to_string());
    active.model = Set(input.model.trim().to_string());
    active.barcode = Set(optional(input.barcode));
    active.sale_price = Set(input.sale_price);
    active.image_url = Set(optional(input.image_url));
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Soft deletes a product. Invoice history that references it is preserved.
pub async fn delete_product(db: &DatabaseConnection, store_id: i64, product_id: i64) -> Result<()> {
    let product = find_store_product(db, store_id, product_id).await?;

    let mut active: product::ActiveModel = product.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    tracing::info!(store_id, product_id, "Product deleted");
    Ok(())
}

/// Adds a size/color variant to a product.
pub async fn add_variant(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
    input: VariantInput,
) -> Result<product_variant::Model> {
    validate_variant(&input)?;
    let product = find_store_product(db, store_id, product_id).await?;
    variant_model(product.id, &input)
        .insert(db)
        .await
        .map_err(Into::into)
}

/// Sets the stock of a variant to an absolute value (restocking, counts).
pub async fn set_variant_stock(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
    variant_id: i64,
    stock: i32,
) -> Result<product_variant::Model> {
    validate_stock(stock)?;
    let product = find_store_product(db, store_id, product_id).await?;

    let variant = ProductVariant::find_by_id(variant_id)
        .filter(product_variant::Column::ProductId.eq(product.id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Variant", variant_id))?;

    let mut active: product_variant::ActiveModel = variant.into();
    active.stock = Set(stock);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::PlanTier;
    use crate::test_utils::*;

    fn input(name: &str, price: f64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            brand: "Nike".to_string(),
            model: "Air".to_string(),
            barcode: Some("7701234".to_string()),
            sale_price: price,
            image_url: None,
        }
    }

    fn variant(size: &str, stock: i32) -> VariantInput {
        VariantInput {
            size: size.to_string(),
            color: "Negro".to_string(),
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_product(&db, 1, input("  ", 10.0), vec![]).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, 1, input("Runner", -1.0), vec![]).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, 1, input("Runner", f64::NAN), vec![]).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, 1, input("Runner", 10.0), vec![variant("42", -3)]).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, 1, input("Runner", 10.0), vec![variant("", 3)]).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_products() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;

        create_product(&db, store.id, input("Zeta", 50.0), vec![variant("40", 2)]).await?;
        let created = create_product(
            &db,
            store.id,
            input("Alpha", 120.5),
            vec![variant("41", 3), variant("42", 0)],
        )
        .await?;
        assert_eq!(created.variants.len(), 2);
        assert_eq!(created.product.barcode.as_deref(), Some("7701234"));

        let products = list_products(&db, store.id).await?;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product.name, "Alpha");
        assert_eq!(products[0].variants.len(), 2);
        assert_eq!(products[1].product.name, "Zeta");

        Ok(())
    }

    #[tokio::test]
    async fn test_products_are_isolated_per_store() -> Result<()> {
        let db = setup_test_db().await?;
        let (store_a, _) = create_test_store(&db, "A").await?;
        let (store_b, _) = create_test_store(&db, "B").await?;
        let product = create_product(&db, store_a.id, input("Runner", 10.0), vec![]).await?;

        assert!(list_products(&db, store_b.id).await?.is_empty());
        let result = get_product(&db, store_b.id, product.product.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        let result = delete_product(&db, store_b.id, product.product.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_plan_limit_blocks_creation() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        set_plan_product_limit(&db, PlanTier::Free, Some(2)).await?;

        create_product(&db, store.id, input("One", 10.0), vec![]).await?;
        let second = create_product(&db, store.id, input("Two", 10.0), vec![]).await?;

        let result = create_product(&db, store.id, input("Three", 10.0), vec![]).await;
        assert!(matches!(
            result,
            Err(Error::PlanLimitReached { limit: 2, .. })
        ));

        // Deleted products free their slot
        delete_product(&db, store.id, second.product.id).await?;
        create_product(&db, store.id, input("Three", 10.0), vec![]).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        let created = create_product(&db, store.id, input("Runner", 10.0), vec![]).await?;

        let updated =
            update_product(&db, store.id, created.product.id, input("Runner Pro", 15.0)).await?;
        assert_eq!(updated.name, "Runner Pro");
        assert_eq!(updated.sale_price, 15.0);

        delete_product(&db, store.id, created.product.id).await?;
        let row = Product::find_by_id(created.product.id).one(&db).await?.unwrap();
        assert!(row.is_deleted);
        assert!(list_products(&db, store.id).await?.is_empty());

        let result = update_product(&db, store.id, created.product.id, input("X", 1.0)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_variants_and_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;
        let created = create_product(&db, store.id, input("Runner", 10.0), vec![]).await?;

        let added = add_variant(&db, store.id, created.product.id, variant("43", 4)).await?;
        assert_eq!(added.stock, 4);

        let restocked =
            set_variant_stock(&db, store.id, created.product.id, added.id, 12).await?;
        assert_eq!(restocked.stock, 12);

        let result = set_variant_stock(&db, store.id, created.product.id, added.id, -1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let other = create_product(&db, store.id, input("Other", 10.0), vec![]).await?;
        let result = set_variant_stock(&db, store.id, other.product.id, added.id, 1).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
