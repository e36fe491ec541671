use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dtos::subscription::{
    CustomerUserBrief, SubscriptionCustomerBrief, SubscriptionLineResponse,
};
use crate::models::{InvoiceWithCustomerRow, Payment};

/// Invoice creation input. Totals are intentionally absent: the service
/// computes them from the subscription and active tax rules.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub subscription_id: Option<Uuid>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub id: Option<Uuid>,
    pub status: Option<String>,
    pub subtotal: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub subscription_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub customer: SubscriptionCustomerBrief,
    pub payments: Vec<Payment>,
    pub lines: Vec<SubscriptionLineResponse>,
}

impl InvoiceResponse {
    pub fn from_parts(
        row: InvoiceWithCustomerRow,
        payments: Vec<Payment>,
        lines: Vec<SubscriptionLineResponse>,
    ) -> Self {
        let amount_paid = payments.iter().map(|p| p.amount).sum();
        Self {
            id: row.invoice_id,
            invoice_number: row.invoice_number,
            subscription_id: row.subscription_id,
            customer_id: row.customer_id,
            invoice_date: row.invoice_date,
            due_date: row.due_date,
            status: row.status,
            subtotal: row.subtotal,
            tax_amount: row.tax_amount,
            total_amount: row.total_amount,
            amount_paid,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
            customer: SubscriptionCustomerBrief {
                id: row.customer_id,
                user: CustomerUserBrief {
                    first_name: row.first_name,
                    last_name: row.last_name,
                    email: row.email,
                },
            },
            payments,
            lines,
        }
    }
}
