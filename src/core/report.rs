//! Sales report generation.
//!
//! Statistics cover completed invoices only and are aggregated in Rust from
//! the filtered invoice set, so the same code runs on every database backend.
//! The serialized field names are the ones the reports view consumes.

use crate::{
    core::invoice::round_currency,
    entities::{Invoice, InvoiceItem, InvoiceStatus, PaymentMethod, Product, invoice, product},
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate, NaiveTime};
use sea_orm::{QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Products listed in the top sellers table.
const TOP_PRODUCTS: usize = 10;
/// Days with sales listed in the daily table.
const DAILY_ROWS: usize = 30;

/// Optional inclusive calendar-date filter (UTC)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Headline numbers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    #[serde(rename = "total_facturas")]
    pub invoice_count: u64,
    /// `None` when there are no sales
    #[serde(rename = "ventas_totales")]
    pub total_sales: Option<f64>,
    #[serde(rename = "ticket_promedio")]
    pub average_ticket: Option<f64>,
}

/// A best-selling product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "codigo_barras")]
    pub barcode: Option<String>,
    #[serde(rename = "cantidad_vendida")]
    pub units_sold: i64,
    #[serde(rename = "total_ventas")]
    pub revenue: f64,
}

/// Sales of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "facturas")]
    pub invoices: u64,
    #[serde(rename = "ventas")]
    pub total: f64,
}

/// Sales paid with one method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSales {
    #[serde(rename = "metodo_pago")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "cantidad")]
    pub invoices: u64,
    pub total: f64,
}

/// Complete sales statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesStats {
    #[serde(rename = "resumen")]
    pub summary: SalesSummary,
    #[serde(rename = "productos_top")]
    pub top_products: Vec<TopProduct>,
    /// Most recent days first
    #[serde(rename = "ventas_por_dia")]
    pub daily: Vec<DailySales>,
    #[serde(rename = "ventas_por_metodo")]
    pub by_payment_method: Vec<MethodSales>,
}

#[derive(Default)]
struct ProductTally {
    units: i64,
    revenue: f64,
}

/// Computes sales statistics for the store's completed invoices.
///
/// # Errors
/// Returns [`Error::Validation`] if `from` is after `to`.
pub async fn get_sales_stats(
    db: &DatabaseConnection,
    store_id: i64,
    range: DateRange,
) -> Result<SalesStats> {
    let mut query = Invoice::find()
        .filter(invoice::Column::StoreId.eq(store_id))
        .filter(invoice::Column::Status.eq(InvoiceStatus::Completada));

    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(Error::validation(
                "The start date must not be after the end date",
            ));
        }
    }
    if let Some(from) = range.from {
        query = query.filter(
            invoice::Column::CreatedAt.gte(from.and_time(NaiveTime::MIN).and_utc()),
        );
    }
    if let Some(to) = range.to {
        // Inclusive end date: everything before the following midnight
        if let Some(next_day) = to.checked_add_days(Days::new(1)) {
            query = query.filter(
                invoice::Column::CreatedAt.lt(next_day.and_time(NaiveTime::MIN).and_utc()),
            );
        }
    }

    let rows = query
        .order_by_asc(invoice::Column::Id)
        .find_with_related(InvoiceItem)
        .all(db)
        .await?;

    let invoice_count = rows.len() as u64;
    let total_sales: f64 = rows.iter().map(|(inv, _)| inv.total).sum();
    let summary = if rows.is_empty() {
        SalesSummary {
            invoice_count: 0,
            total_sales: None,
            average_ticket: None,
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let average = total_sales / invoice_count as f64;
        SalesSummary {
            invoice_count,
            total_sales: Some(round_currency(total_sales)),
            average_ticket: Some(round_currency(average)),
        }
    };

    let mut per_product: HashMap<i64, ProductTally> = HashMap::new();
    let mut per_day: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
    let mut per_method: BTreeMap<PaymentMethod, (u64, f64)> = BTreeMap::new();

    for (inv, items) in &rows {
        let day = per_day.entry(inv.created_at.date_naive()).or_default();
        day.0 += 1;
        day.1 += inv.total;

        let method = per_method.entry(inv.payment_method).or_default();
        method.0 += 1;
        method.1 += inv.total;

        for item in items {
            let tally = per_product.entry(item.product_id).or_default();
            tally.units += i64::from(item.quantity);
            tally.revenue += item.subtotal;
        }
    }

    let products: HashMap<i64, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(per_product.keys().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut top_products: Vec<TopProduct> = per_product
        .into_iter()
        .map(|(product_id, tally)| {
            let product = products.get(&product_id);
            TopProduct {
                name: product.map(|p| p.name.clone()).unwrap_or_default(),
                barcode: product.and_then(|p| p.barcode.clone()),
                units_sold: tally.units,
                revenue: round_currency(tally.revenue),
            }
        })
        .collect();
    top_products.sort_by(|a, b| {
        b.units_sold
            .cmp(&a.units_sold)
            .then_with(|| b.revenue.total_cmp(&a.revenue))
            .then_with(|| a.name.cmp(&b.name))
    });
    top_products.truncate(TOP_PRODUCTS);

    let daily = per_day
        .into_iter()
        .rev()
        .take(DAILY_ROWS)
        .map(|(date, (invoices, total))| DailySales {
            date,
            invoices,
            total: round_currency(total),
        })
        .collect();

    let mut by_payment_method: Vec<MethodSales> = per_method
        .into_iter()
        .map(|(payment_method, (invoices, total))| MethodSales {
            payment_method,
            invoices,
            total: round_currency(total),
        })
        .collect();
    by_payment_method.sort_by(|a, b| b.total.total_cmp(&a.total));

    Ok(SalesStats {
        summary,
        top_products,
        daily,
        by_payment_method,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::invoice::{InvoiceItemInput, NewInvoice, cancel_invoice, create_invoice};
    use crate::entities::Role;
    use crate::test_utils::*;
    use chrono::Utc;

    fn sale(
        product_id: i64,
        variant_id: i64,
        quantity: i32,
        unit_price: f64,
        payment_method: PaymentMethod,
    ) -> NewInvoice {
        NewInvoice {
            customer_name: "Cliente".to_string(),
            customer_document: None,
            customer_phone: None,
            customer_address: None,
            payment_method,
            items: vec![InvoiceItemInput {
                product_id,
                variant_id,
                quantity,
                unit_price,
            }],
        }
    }

    #[tokio::test]
    async fn test_empty_stats() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, _) = create_test_store(&db, "Uno").await?;

        let stats = get_sales_stats(&db, store.id, DateRange::default()).await?;
        assert_eq!(stats.summary.invoice_count, 0);
        assert_eq!(stats.summary.total_sales, None);
        assert_eq!(stats.summary.average_ticket, None);
        assert!(stats.top_products.is_empty());
        assert!(stats.daily.is_empty());
        assert!(stats.by_payment_method.is_empty());

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["resumen"]["total_facturas"], 0);
        assert!(json["resumen"]["ventas_totales"].is_null());
        assert!(json["productos_top"].as_array().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_range() -> Result<()> {
        let db = setup_test_db().await?;
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2025, 5, 2),
            to: NaiveDate::from_ymd_opt(2025, 5, 1),
        };
        let result = get_sales_stats(&db, 1, range).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_stats_aggregate_completed_sales() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, owner) = create_test_store(&db, "Uno").await?;
        let (runner, runner_42) = create_test_product(&db, store.id, "Runner", 20).await?;
        let (boot, boot_42) = create_test_product(&db, store.id, "Boot", 20).await?;

        create_invoice(
            &db,
            store.id,
            owner.id,
            sale(runner.id, runner_42.id, 3, 100.0, PaymentMethod::Efectivo),
        )
        .await?;
        create_invoice(
            &db,
            store.id,
            owner.id,
            sale(boot.id, boot_42.id, 1, 200.0, PaymentMethod::Tarjeta),
        )
        .await?;
        let cancelled = create_invoice(
            &db,
            store.id,
            owner.id,
            sale(boot.id, boot_42.id, 5, 200.0, PaymentMethod::Tarjeta),
        )
        .await?;
        cancel_invoice(&db, store.id, cancelled.invoice.id, Role::Owner).await?;

        // Another store's sales never leak in
        let (other, other_owner) = create_test_store(&db, "Dos").await?;
        let (p, v) = create_test_product(&db, other.id, "Other", 5).await?;
        create_invoice(
            &db,
            other.id,
            other_owner.id,
            sale(p.id, v.id, 1, 999.0, PaymentMethod::Efectivo),
        )
        .await?;

        let stats = get_sales_stats(&db, store.id, DateRange::default()).await?;
        assert_eq!(stats.summary.invoice_count, 2);
        assert_eq!(stats.summary.total_sales, Some(595.0));
        assert_eq!(stats.summary.average_ticket, Some(297.5));

        assert_eq!(stats.top_products.len(), 2);
        assert_eq!(stats.top_products[0].name, "Runner");
        assert_eq!(stats.top_products[0].units_sold, 3);
        assert_eq!(stats.top_products[0].revenue, 300.0);
        assert_eq!(stats.top_products[1].name, "Boot");

        assert_eq!(stats.daily.len(), 1);
        assert_eq!(stats.daily[0].date, Utc::now().date_naive());
        assert_eq!(stats.daily[0].invoices, 2);

        assert_eq!(stats.by_payment_method.len(), 2);
        assert_eq!(stats.by_payment_method[0].payment_method, PaymentMethod::Efectivo);
        assert_eq!(stats.by_payment_method[0].total, 357.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_date_range_filter() -> Result<()> {
        let db = setup_test_db().await?;
        let (store, owner) = create_test_store(&db, "Uno").await?;
        let (product, variant) = create_test_product(&db, store.id, "Runner", 20).await?;

        let old = create_invoice(
            &db,
            store.id,
            owner.id,
            sale(product.id, variant.id, 1, 100.0, PaymentMethod::Efectivo),
        )
        .await?;
        backdate_invoice(&db, old.invoice.id, 3).await?;
        create_invoice(
            &db,
            store.id,
            owner.id,
            sale(product.id, variant.id, 2, 100.0, PaymentMethod::Efectivo),
        )
        .await?;

        let today = Utc::now().date_naive();
        let only_today = get_sales_stats(
            &db,
            store.id,
            DateRange {
                from: Some(today),
                to: Some(today),
            },
        )
        .await?;
        assert_eq!(only_today.summary.invoice_count, 1);
        assert_eq!(only_today.summary.total_sales, Some(238.0));

        let all = get_sales_stats(&db, store.id, DateRange::default()).await?;
        assert_eq!(all.daily.len(), 2);
        assert!(all.daily[0].date > all.daily[1].date);

        let empty = get_sales_stats(
            &db,
            store.id,
            DateRange {
                from: NaiveDate::from_ymd_opt(2001, 1, 1),
                to: NaiveDate::from_ymd_opt(2001, 1, 31),
            },
        )
        .await?;
        assert_eq!(empty.summary.invoice_count, 0);
        assert_eq!(empty.summary.total_sales, None);
        Ok(())
    }
}
