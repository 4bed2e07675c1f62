//! Invoice and sales report handlers

use crate::{
    api::{
        extract::{ApiJson, ApiPath, ApiQuery, AuthUser},
        state::AppState,
    },
    core::{
        invoice::{self, InvoiceDetail, InvoiceSummary, NewInvoice},
        policy::Action,
        report::{self, DateRange, SalesStats},
    },
    entities::InvoiceModel,
    errors::Result,
};
use axum::{extract::State, http::StatusCode};

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiJson<Vec<InvoiceSummary>>> {
    user.require(Action::ViewInvoices)?;
    invoice::list_invoices(&state.db, user.store_id)
        .await
        .map(ApiJson)
}

pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(range): ApiQuery<DateRange>,
) -> Result<ApiJson<SalesStats>> {
    user.require(Action::ViewReports)?;
    report::get_sales_stats(&state.db, user.store_id, range)
        .await
        .map(ApiJson)
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(invoice_id): ApiPath<i64>,
) -> Result<ApiJson<InvoiceDetail>> {
    user.require(Action::ViewInvoices)?;
    invoice::get_invoice_by_id(&state.db, user.store_id, invoice_id)
        .await
        .map(ApiJson)
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewInvoice>,
) -> Result<(StatusCode, ApiJson<InvoiceSummary>)> {
    user.require(Action::CreateInvoice)?;
    let created = invoice::create_invoice(&state.db, user.store_id, user.user_id, input).await?;
    Ok((StatusCode::CREATED, ApiJson(created)))
}

/// The same-day rule is enforced by the core with the caller's role.
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(invoice_id): ApiPath<i64>,
) -> Result<ApiJson<InvoiceModel>> {
    invoice::cancel_invoice(&state.db, user.store_id, invoice_id, user.role)
        .await
        .map(ApiJson)
}
