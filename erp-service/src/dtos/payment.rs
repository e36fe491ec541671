use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dtos::subscription::CustomerUserBrief;
use crate::models::PaymentWithInvoiceRow;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub invoice_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInvoiceBrief {
    pub id: Uuid,
    pub invoice_number: String,
    pub status: String,
    pub user: CustomerUserBrief,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub invoice: PaymentInvoiceBrief,
}

impl From<PaymentWithInvoiceRow> for PaymentResponse {
    fn from(row: PaymentWithInvoiceRow) -> Self {
        Self {
            id: row.payment_id,
            invoice_id: row.invoice_id,
            amount: row.amount,
            payment_method: row.payment_method,
            payment_date: row.payment_date,
            reference: row.reference,
            created_utc: row.created_utc,
            invoice: PaymentInvoiceBrief {
                id: row.invoice_id,
                invoice_number: row.invoice_number,
                status: row.invoice_status,
                user: CustomerUserBrief {
                    first_name: row.first_name,
                    last_name: row.last_name,
                    email: row.email,
                },
            },
        }
    }
}
