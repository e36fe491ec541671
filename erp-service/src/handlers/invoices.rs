//! Invoice endpoints. Totals are computed server-side at creation from the
//! subscription's lines (or plan price) and the active percentage taxes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    dtos::{
        invoice::{CreateInvoiceRequest, InvoiceResponse, UpdateInvoiceRequest},
        subscription::SubscriptionLineResponse,
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{CreateInvoice, InvoiceStatus, Payment, UpdateInvoice},
    services::{
        policy::{self, Capability},
        settlement,
    },
    startup::AppState,
};
use erp_core::error::AppError;

/// Lines of the subscription backing an invoice, for the detail view.
async fn invoice_lines(
    state: &AppState,
    subscription_id: Option<Uuid>,
) -> Result<Vec<SubscriptionLineResponse>, AppError> {
    let Some(subscription_id) = subscription_id else {
        return Ok(Vec::new());
    };
    let lines = state.db.lines_with_products(&[subscription_id]).await?;
    Ok(lines.into_iter().map(Into::into).collect())
}

/// Single invoice by `?id=` with payments and lines, or the full list.
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Response, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    if let Some(id) = query.id {
        let row = state
            .db
            .get_invoice_with_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        let payments = state.db.payments_for_invoice(id).await?;
        let lines = invoice_lines(&state, row.subscription_id).await?;

        return Ok(Json(InvoiceResponse::from_parts(row, payments, lines)).into_response());
    }

    let rows = state.db.list_invoices_with_customer().await?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.invoice_id).collect();

    let mut payments_by_invoice: HashMap<Uuid, Vec<Payment>> = HashMap::new();
    for payment in state.db.payments_for_invoices(&ids).await? {
        payments_by_invoice
            .entry(payment.invoice_id)
            .or_default()
            .push(payment);
    }

    let responses: Vec<InvoiceResponse> = rows
        .into_iter()
        .map(|row| {
            let payments = payments_by_invoice.remove(&row.invoice_id).unwrap_or_default();
            InvoiceResponse::from_parts(row, payments, Vec::new())
        })
        .collect();

    Ok(Json(responses).into_response())
}

/// Create an invoice for a subscription. The caller cannot supply totals;
/// they are derived from the subscription and active tax rules.
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let (Some(subscription_id), Some(invoice_number)) = (req.subscription_id, req.invoice_number)
    else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Subscription and invoice number are required"
        )));
    };

    let subscription = state
        .db
        .get_subscription(subscription_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))?;

    let lines = state.db.subscription_lines(subscription_id).await?;
    let components: Vec<(i32, _)> = lines.iter().map(|l| (l.quantity, l.unit_price)).collect();
    let plan_price = match subscription.plan_id {
        Some(plan_id) => state.db.plan_price(plan_id).await?,
        None => None,
    };

    let subtotal = settlement::subscription_total(&components, plan_price);
    let tax_rates = state.db.active_percentage_tax_rates().await?;
    let totals = settlement::invoice_totals(subtotal, &tax_rates);

    let invoice_date = req.invoice_date.unwrap_or_else(|| Utc::now().date_naive());
    let due_date = req.due_date.unwrap_or(invoice_date + Duration::days(30));

    let invoice = state
        .db
        .create_invoice(&CreateInvoice {
            invoice_number,
            subscription_id,
            customer_id: subscription.customer_id,
            invoice_date,
            due_date,
            status: req
                .status
                .as_deref()
                .map(InvoiceStatus::from_string)
                .unwrap_or(InvoiceStatus::Draft),
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
        })
        .await?;

    let row = state
        .db
        .get_invoice_with_customer(invoice.invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    let lines = invoice_lines(&state, row.subscription_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::from_parts(row, Vec::new(), lines)),
    ))
}

/// Update an invoice; explicit operator corrections to totals are allowed,
/// and the status is re-settled against recorded payments afterwards.
pub async fn update_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invoice ID is required")))?;

    state
        .db
        .update_invoice(
            id,
            &UpdateInvoice {
                status: req.status.as_deref().map(InvoiceStatus::from_string),
                subtotal: req.subtotal,
                tax_amount: req.tax_amount,
                total_amount: req.total_amount,
                due_date: req.due_date,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    settlement::settle_invoice(&state.db, id).await?;

    let row = state
        .db
        .get_invoice_with_customer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    let payments = state.db.payments_for_invoice(id).await?;
    let lines = invoice_lines(&state, row.subscription_id).await?;

    Ok(Json(InvoiceResponse::from_parts(row, payments, lines)))
}

/// Delete an invoice; its payments cascade.
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invoice ID is required")))?;

    if !state.db.delete_invoice(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
