use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CustomerSubscriptionSummary, CustomerWithUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub id: Option<Uuid>,
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

/// User fields exposed on customer views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

/// Per-subscription summary on the customer list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSubscriptionBrief {
    pub id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: Uuid,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub user: UserSummary,
    pub subscriptions: Vec<CustomerSubscriptionBrief>,
}

impl CustomerResponse {
    pub fn from_parts(
        row: CustomerWithUser,
        subscriptions: Vec<CustomerSubscriptionSummary>,
    ) -> Self {
        Self {
            id: row.customer_id,
            company_name: row.company_name,
            phone: row.phone,
            address: row.address,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
            user: UserSummary {
                id: row.user_id,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                is_active: row.is_active,
            },
            subscriptions: subscriptions
                .into_iter()
                .map(|s| CustomerSubscriptionBrief {
                    id: s.subscription_id,
                    status: s.status,
                    total_amount: s.total_amount,
                })
                .collect(),
        }
    }
}
