//! Catalog handlers

use crate::{
    api::{
        extract::{ApiJson, ApiPath, AuthUser},
        state::AppState,
    },
    core::{
        catalog::{self, ProductInput, ProductWithVariants, VariantInput},
        policy::Action,
    },
    entities::{ProductModel, ProductVariantModel},
    errors::Result,
};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

/// Body of `POST /api/products`
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(flatten)]
    pub product: ProductInput,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

/// Body of `PATCH /api/products/{id}/variants/{variant_id}`
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub stock: i32,
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiJson<Vec<ProductWithVariants>>> {
    user.require(Action::ViewCatalog)?;
    catalog::list_products(&state.db, user.store_id)
        .await
        .map(ApiJson)
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<ApiJson<ProductWithVariants>> {
    user.require(Action::ViewCatalog)?;
    catalog::get_product(&state.db, user.store_id, product_id)
        .await
        .map(ApiJson)
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, ApiJson<ProductWithVariants>)> {
    user.require(Action::ManageCatalog)?;
    let created =
        catalog::create_product(&state.db, user.store_id, body.product, body.variants).await?;
    Ok((StatusCode::CREATED, ApiJson(created)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<ApiJson<ProductModel>> {
    user.require(Action::ManageCatalog)?;
    catalog::update_product(&state.db, user.store_id, product_id, input)
        .await
        .map(ApiJson)
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(product_id): ApiPath<i64>,
) -> Result<StatusCode> {
    user.require(Action::ManageCatalog)?;
    catalog::delete_product(&state.db, user.store_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_variant(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(input): ApiJson<VariantInput>,
) -> Result<(StatusCode, ApiJson<ProductVariantModel>)> {
    user.require(Action::ManageCatalog)?;
    let variant = catalog::add_variant(&state.db, user.store_id, product_id, input).await?;
    Ok((StatusCode::CREATED, ApiJson(variant)))
}

pub async fn set_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((product_id, variant_id)): ApiPath<(i64, i64)>,
    ApiJson(body): ApiJson<StockRequest>,
) -> Result<ApiJson<ProductVariantModel>> {
    user.require(Action::ManageCatalog)?;
    catalog::set_variant_stock(&state.db, user.store_id, product_id, variant_id, body.stock)
        .await
        .map(ApiJson)
}
