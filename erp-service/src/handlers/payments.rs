//! Payment endpoints. Every mutation is followed by a settlement pass that
//! re-derives the invoice status from its recorded payments.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    dtos::{
        payment::{CreatePaymentRequest, PaymentResponse, UpdatePaymentRequest},
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{CreatePayment, PaymentMethod, UpdatePayment},
    services::{
        policy::{self, Capability},
        settlement,
    },
    startup::AppState,
};
use erp_core::error::AppError;

/// List all payments, most recent payment date first.
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    let payments = state.db.list_payments_with_invoice().await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Record a payment. Method defaults to CREDIT_CARD and the payment date
/// to today; the invoice settles immediately afterwards.
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let (Some(invoice_id), Some(amount)) = (req.invoice_id, req.amount) else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invoice and amount are required"
        )));
    };

    if state.db.get_invoice(invoice_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }

    let payment = state
        .db
        .create_payment(&CreatePayment {
            invoice_id,
            amount,
            payment_method: req
                .payment_method
                .as_deref()
                .map(PaymentMethod::from_string)
                .unwrap_or(PaymentMethod::CreditCard),
            payment_date: req.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            reference: req.reference,
        })
        .await?;

    settlement::settle_invoice(&state.db, invoice_id).await?;

    let response = state
        .db
        .get_payment_with_invoice(payment.payment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment not found")))?;

    Ok((StatusCode::CREATED, Json(response.into())))
}

/// Update a payment, then settle its invoice.
pub async fn update_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Payment ID is required")))?;

    let payment = state
        .db
        .update_payment(
            id,
            &UpdatePayment {
                amount: req.amount,
                payment_method: req.payment_method.as_deref().map(PaymentMethod::from_string),
                reference: req.reference,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment not found")))?;

    settlement::settle_invoice(&state.db, payment.invoice_id).await?;

    let response = state
        .db
        .get_payment_with_invoice(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment not found")))?;

    Ok(Json(response.into()))
}

/// Delete a payment, then settle the invoice it belonged to.
pub async fn delete_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Payment ID is required")))?;

    let invoice_id = state
        .db
        .delete_payment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment not found")))?;

    settlement::settle_invoice(&state.db, invoice_id).await?;

    Ok(Json(DeleteResponse { success: true }))
}
