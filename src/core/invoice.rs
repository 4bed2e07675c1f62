//! Invoicing business logic - sales, stock movements and cancellations.
//!
//! Creating an invoice inserts the header, one line per item and decrements
//! each variant's stock inside a single transaction. The decrement is a
//! conditional update (`stock >= quantity`), so concurrent sales can never
//! drive stock below zero; any failing line rolls the whole sale back.

use crate::{
    core::policy::{self, Action},
    entities::{
        Invoice, InvoiceItem, InvoiceStatus, PaymentMethod, Product, ProductVariant, Role, Store,
        User, invoice, invoice_item, product, product_variant, user,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed VAT rate applied to every sale.
pub const TAX_RATE: f64 = 0.19;

/// Rounds a money amount to two decimals, halves away from zero.
#[must_use]
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One requested invoice line
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceItemInput {
    pub product_id: i64,
    pub variant_id: i64,
    pub quantity: i32,
    pub unit_price: f64,
}

/// A sale as submitted by the point of sale
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub customer_name: String,
    pub customer_document: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<InvoiceItemInput>,
}

/// Money totals of a sale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Computes subtotal, VAT and total of a set of lines.
#[must_use]
pub fn compute_totals(items: &[InvoiceItemInput]) -> Totals {
    let subtotal: f64 = items
        .iter()
        .map(|item| f64::from(item.quantity) * item.unit_price)
        .sum();
    let tax = subtotal * TAX_RATE;
    Totals {
        subtotal: round_currency(subtotal),
        tax: round_currency(tax),
        total: round_currency(subtotal + tax),
    }
}

/// Invoice header with the seller's name and line counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub vendor_name: String,
    /// Number of lines
    pub item_count: usize,
    /// Units across all lines
    pub unit_count: i64,
}

/// One invoice line joined with its product and variant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub barcode: Option<String>,
    pub variant_id: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Full invoice as shown on the receipt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub vendor_name: String,
    pub store_name: String,
    pub items: Vec<InvoiceLine>,
}

fn validate_new_invoice(input: &NewInvoice) -> Result<()> {
    if input.customer_name.trim().is_empty() {
        return Err(Error::validation("Customer name is required"));
    }
    if input.items.is_empty() {
        return Err(Error::validation("The invoice must contain at least one product"));
    }
    for item in &input.items {
        if item.quantity <= 0 {
            return Err(Error::validation("Quantity must be greater than zero"));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(Error::validation("Unit price must be a non-negative number"));
        }
    }
    Ok(())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Subtracts `quantity` units from a variant only if enough stock is on hand.
async fn take_stock<C>(db: &C, product_id: i64, variant_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = ProductVariant::update_many()
        .col_expr(
            product_variant::Column::Stock,
            Expr::col(product_variant::Column::Stock).sub(quantity),
        )
        .filter(product_variant::Column::Id.eq(variant_id))
        .filter(product_variant::Column::ProductId.eq(product_id))
        .filter(product_variant::Column::Stock.gte(quantity))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let exists = ProductVariant::find_by_id(variant_id)
            .filter(product_variant::Column::ProductId.eq(product_id))
            .one(db)
            .await?
            .is_some();
        return Err(if exists {
            Error::InsufficientStock {
                variant_id,
                requested: quantity,
            }
        } else {
            Error::not_found("Variant", variant_id)
        });
    }
    Ok(())
}

/// Puts `quantity` units back on a variant.
async fn restore_stock<C>(db: &C, variant_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    ProductVariant::update_many()
        .col_expr(
            product_variant::Column::Stock,
            Expr::col(product_variant::Column::Stock).add(quantity),
        )
        .filter(product_variant::Column::Id.eq(variant_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn vendor_names<C>(db: &C, user_ids: Vec<i64>) -> Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    Ok(User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect())
}

/// Records a sale and takes its units out of stock, all or nothing.
///
/// # Errors
/// Returns an error if:
/// - The customer name is blank, there are no items, a quantity is not
///   positive or a unit price is negative
/// - A product or variant does not exist in the caller's store
/// - A variant has fewer units than requested (nothing is persisted)
/// - The database fails
pub async fn create_invoice(
    db: &DatabaseConnection,
    store_id: i64,
    user_id: i64,
    input: NewInvoice,
) -> Result<InvoiceSummary> {
    validate_new_invoice(&input)?;
    let totals = compute_totals(&input.items);

    let txn = db.begin().await?;

    let invoice = invoice::ActiveModel {
        store_id: Set(store_id),
        user_id: Set(user_id),
        customer_name: Set(input.customer_name.trim().to_string()),
        customer_document: Set(optional(input.customer_document)),
        customer_phone: Set(optional(input.customer_phone)),
        customer_address: Set(optional(input.customer_address)),
        subtotal: Set(totals.subtotal),
        tax: Set(totals.tax),
        total: Set(totals.total),
        payment_method: Set(input.payment_method),
        status: Set(InvoiceStatus::Completada),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut unit_count = 0_i64;
    for item in &input.items {
        crate::core::catalog::find_store_product(&txn, store_id, item.product_id).await?;
        take_stock(&txn, item.product_id, item.variant_id, item.quantity).await?;

        invoice_item::ActiveModel {
            invoice_id: Set(invoice.id),
            product_id: Set(item.product_id),
            variant_id: Set(item.variant_id),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            subtotal: Set(round_currency(f64::from(item.quantity) * item.unit_price)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        unit_count += i64::from(item.quantity);
    }

    let vendor_name = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .map(|u| u.name)
        .unwrap_or_default();

    txn.commit().await?;

    tracing::info!(
        store_id,
        invoice_id = invoice.id,
        total = invoice.total,
        lines = input.items.len(),
        "Invoice created"
    );

    Ok(InvoiceSummary {
        invoice,
        vendor_name,
        item_count: input.items.len(),
        unit_count,
    })
}

/// Lists the store's invoices, newest first.
pub async fn list_invoices(db: &DatabaseConnection, store_id: i64) -> Result<Vec<InvoiceSummary>> {
    let rows = Invoice::find()
        .filter(invoice::Column::StoreId.eq(store_id))
        .order_by_desc(invoice::Column::CreatedAt)
        .order_by_desc(invoice::Column::Id)
        .find_with_related(InvoiceItem)
        .all(db)
        .await?;

    let mut user_ids: Vec<i64> = rows.iter().map(|(inv, _)| inv.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let names = vendor_names(db, user_ids).await?;

    Ok(rows
        .into_iter()
        .map(|(invoice, items)| InvoiceSummary {
            vendor_name: names.get(&invoice.user_id).cloned().unwrap_or_default(),
            item_count: items.len(),
            unit_count: items.iter().map(|i| i64::from(i.quantity)).sum(),
            invoice,
        })
        .collect())
}

/// Retrieves one invoice of the store with its lines.
///
/// # Errors
/// Returns [`Error::NotFound`] if the invoice does not exist or belongs to another store.
pub async fn get_invoice_by_id(
    db: &DatabaseConnection,
    store_id: i64,
    invoice_id: i64,
) -> Result<InvoiceDetail> {
    let invoice = Invoice::find_by_id(invoice_id)
        .filter(invoice::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;

    let items = invoice
        .find_related(InvoiceItem)
        .order_by_asc(invoice_item::Column::Id)
        .all(db)
        .await?;

    let products: HashMap<i64, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(items.iter().map(|i| i.product_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let variants: HashMap<i64, product_variant::Model> = ProductVariant::find()
        .filter(product_variant::Column::Id.is_in(items.iter().map(|i| i.variant_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let vendor_name = vendor_names(db, vec![invoice.user_id])
        .await?
        .remove(&invoice.user_id)
        .unwrap_or_default();
    let store_name = Store::find_by_id(store_id)
        .one(db)
        .await?
        .map(|s| s.name)
        .unwrap_or_default();

    let items = items
        .into_iter()
        .map(|item| {
            let product = products.get(&item.product_id);
            let variant = variants.get(&item.variant_id);
            InvoiceLine {
                id: item.id,
                product_id: item.product_id,
                product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                barcode: product.and_then(|p| p.barcode.clone()),
                variant_id: item.variant_id,
                size: variant.map(|v| v.size.clone()),
                color: variant.map(|v| v.color.clone()),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            }
        })
        .collect();

    Ok(InvoiceDetail {
        invoice,
        vendor_name,
        store_name,
        items,
    })
}

/// Cancels a completed invoice and puts its units back in stock.
///
/// Invoices from an earlier calendar day (UTC) may only be cancelled by
/// back-office roles.
///
/// # Errors
/// Returns an error if:
/// - The invoice does not exist in the caller's store
/// - It is already cancelled
/// - The caller's role may not cancel an invoice of that age
/// - The database fails
pub async fn cancel_invoice(
    db: &DatabaseConnection,
    store_id: i64,
    invoice_id: i64,
    caller_role: Role,
) -> Result<invoice::Model> {
    let txn = db.begin().await?;

    let invoice = Invoice::find_by_id(invoice_id)
        .filter(invoice::Column::StoreId.eq(store_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;

    if invoice.status != InvoiceStatus::Completada {
        return Err(Error::conflict("The invoice is already cancelled"));
    }

    let same_day = invoice.created_at.date_naive() == Utc::now().date_naive();
    if same_day {
        policy::authorize(caller_role, Action::CancelSameDayInvoice)?;
    } else if !policy::can(caller_role, Action::CancelPastInvoice) {
        return Err(Error::forbidden(
            "Only administrators can cancel invoices from previous days",
        ));
    }

    let marked = Invoice::update_many()
        .col_expr(
            invoice::Column::Status,
            Expr::value(InvoiceStatus::Cancelada.to_value()),
        )
        .filter(invoice::Column::Id.eq(invoice_id))
        .filter(invoice::Column::Status.eq(InvoiceStatus::Completada))
        .exec(&txn)
        .await?;
    if marked.rows_affected == 0 {
        return Err(Error::conflict("The invoice is already cancelled"));
    }

    let items = invoice.find_related(InvoiceItem).all(&txn).await?;
    for item in &items {
        restore_stock(&txn, item.variant_id, item.quantity).await?;
    }

    let cancelled = Invoice::find_by_id(invoice_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;

    txn.commit().await?;

    tracing::info!(store_id, invoice_id, role = ?caller_role, "Invoice cancelled");
    Ok(cancelled)
}
