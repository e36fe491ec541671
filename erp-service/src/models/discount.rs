//! Discount configuration model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Discount with an optional validity window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    #[serde(rename = "id")]
    pub discount_id: Uuid,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: String,
    pub value: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a discount.
#[derive(Debug, Clone)]
pub struct CreateDiscount {
    pub name: String,
    pub code: String,
    pub discount_type: String,
    pub value: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

/// Input for updating a discount.
#[derive(Debug, Clone, Default)]
pub struct UpdateDiscount {
    pub name: Option<String>,
    pub code: Option<String>,
    pub discount_type: Option<String>,
    pub value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}
