//! Customer model. Each customer owns exactly one user account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Customer profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "id")]
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a customer profile (the user is created alongside).
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Customer joined with its user account, as read for list/detail views.
#[derive(Debug, Clone, FromRow)]
pub struct CustomerWithUser {
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

/// Input for updating a customer and its linked user's names.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomer {
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
