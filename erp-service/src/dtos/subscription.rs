use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{LineWithProductRow, SubscriptionDetailRow};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLineRequest {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub customer_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    /// Legacy alias for plan_id, still sent by older clients.
    pub recurring_plan_id: Option<Uuid>,
    pub subscription_number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub lines: Option<Vec<SubscriptionLineRequest>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub id: Option<Uuid>,
    pub status: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub plan_id: Option<Uuid>,
    pub recurring_plan_id: Option<Uuid>,
}

/// User name/email shown inside nested customer objects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUserBrief {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCustomerBrief {
    pub id: Uuid,
    pub user: CustomerUserBrief,
}

/// Plan fields exposed on subscription views, served under the legacy
/// `recurringPlan` alias.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanBrief {
    pub name: String,
    pub billing_period: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBrief {
    pub name: String,
    pub description: Option<String>,
    pub sales_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub product: ProductBrief,
}

impl From<LineWithProductRow> for SubscriptionLineResponse {
    fn from(row: LineWithProductRow) -> Self {
        Self {
            id: row.line_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            product: ProductBrief {
                name: row.product_name,
                description: row.product_description,
                sales_price: row.sales_price,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub subscription_number: String,
    pub customer_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub customer: SubscriptionCustomerBrief,
    pub recurring_plan: Option<PlanBrief>,
    pub lines: Vec<SubscriptionLineResponse>,
    pub total_amount: Decimal,
}

impl SubscriptionResponse {
    pub fn from_parts(
        row: SubscriptionDetailRow,
        lines: Vec<SubscriptionLineResponse>,
        total_amount: Decimal,
    ) -> Self {
        let recurring_plan = match (row.plan_name, row.billing_period, row.plan_price) {
            (Some(name), Some(billing_period), Some(price)) => Some(PlanBrief {
                name,
                billing_period,
                price,
            }),
            _ => None,
        };

        Self {
            id: row.subscription_id,
            subscription_number: row.subscription_number,
            customer_id: row.customer_id,
            plan_id: row.plan_id,
            start_date: row.start_date,
            expiration_date: row.expiration_date,
            status: row.status,
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
            recurring_plan,
            lines,
            total_amount,
        }
    }
}
