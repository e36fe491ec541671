//! Invoice model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Confirmed,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Confirmed => "CONFIRMED",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "SENT" => InvoiceStatus::Sent,
            "CONFIRMED" => InvoiceStatus::Confirmed,
            "PAID" => InvoiceStatus::Paid,
            "OVERDUE" => InvoiceStatus::Overdue,
            "CANCELLED" => InvoiceStatus::Cancelled,
            _ => InvoiceStatus::Draft,
        }
    }
}

/// Invoice row. The customer id is denormalized from the subscription at
/// creation so the invoice stays well-formed if the subscription goes away.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(rename = "id")]
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub subscription_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Invoice joined with the customer's user for read views.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceWithCustomerRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub subscription_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Input for creating an invoice. Totals are computed by the service from
/// the subscription and active tax rules, never taken from the caller.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub invoice_number: String,
    pub subscription_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Input for updating an invoice. Totals accept explicit operator
/// corrections; absent fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub status: Option<InvoiceStatus>,
    pub subtotal: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}
