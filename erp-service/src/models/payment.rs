//! Payment model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    BankTransfer,
    Paypal,
    Stripe,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Paypal => "PAYPAL",
            PaymentMethod::Stripe => "STRIPE",
            PaymentMethod::Other => "OTHER",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "DEBIT_CARD" => PaymentMethod::DebitCard,
            "BANK_TRANSFER" => PaymentMethod::BankTransfer,
            "PAYPAL" => PaymentMethod::Paypal,
            "STRIPE" => PaymentMethod::Stripe,
            "OTHER" => PaymentMethod::Other,
            _ => PaymentMethod::CreditCard,
        }
    }
}

/// Payment recorded against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "id")]
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Payment joined with its invoice and the paying customer's user.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentWithInvoiceRow {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub invoice_number: String,
    pub invoice_status: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
}

/// Input for updating a payment.
#[derive(Debug, Clone, Default)]
pub struct UpdatePayment {
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub reference: Option<String>,
}
