//! Tax configuration model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tax rule applied to invoice subtotals. PERCENTAGE rates participate in
/// invoice total computation; FIXED rates are configuration-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    #[serde(rename = "id")]
    pub tax_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub tax_type: String,
    pub rate: Decimal,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a tax rule.
#[derive(Debug, Clone)]
pub struct CreateTax {
    pub name: String,
    pub tax_type: String,
    pub rate: Decimal,
}

/// Input for updating a tax rule.
#[derive(Debug, Clone, Default)]
pub struct UpdateTax {
    pub name: Option<String>,
    pub tax_type: Option<String>,
    pub rate: Option<Decimal>,
    pub is_active: Option<bool>,
}
