//! Product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Service,
    Consumable,
    Storable,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Service => "SERVICE",
            ProductType::Consumable => "CONSUMABLE",
            ProductType::Storable => "STORABLE",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "CONSUMABLE" => ProductType::Consumable,
            "STORABLE" => ProductType::Storable,
            _ => ProductType::Service,
        }
    }
}

/// Product referenced by subscription lines.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "id")]
    pub product_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub description: Option<String>,
    pub sales_price: Decimal,
    pub cost_price: Decimal,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Product with the number of subscription lines referencing it, as served
/// by the list view.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithStats {
    #[serde(rename = "id")]
    pub product_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub description: Option<String>,
    pub sales_price: Decimal,
    pub cost_price: Decimal,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub line_count: i64,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub product_type: ProductType,
    pub description: Option<String>,
    pub sales_price: Decimal,
    pub cost_price: Decimal,
}

/// Input for updating a product.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub product_type: Option<ProductType>,
    pub description: Option<String>,
    pub sales_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_defaults_to_service() {
        assert_eq!(ProductType::from_string("DIGITAL"), ProductType::Service);
        assert_eq!(ProductType::from_string("STORABLE"), ProductType::Storable);
    }
}
