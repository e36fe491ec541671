//! Recurring plan model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Recurrence unit governing a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Daily => "DAILY",
            BillingPeriod::Weekly => "WEEKLY",
            BillingPeriod::Monthly => "MONTHLY",
            BillingPeriod::Yearly => "YEARLY",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "DAILY" => BillingPeriod::Daily,
            "WEEKLY" => BillingPeriod::Weekly,
            "YEARLY" => BillingPeriod::Yearly,
            _ => BillingPeriod::Monthly,
        }
    }
}

/// Recurring plan. Subscriptions without lines bill at the plan price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPlan {
    #[serde(rename = "id")]
    pub plan_id: Uuid,
    pub name: String,
    pub billing_period: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub auto_close: bool,
    pub closable: bool,
    pub pausable: bool,
    pub renewable: bool,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Plan with the number of subscriptions referencing it, as served by the
/// list view.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlanWithStats {
    #[serde(rename = "id")]
    pub plan_id: Uuid,
    pub name: String,
    pub billing_period: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub auto_close: bool,
    pub closable: bool,
    pub pausable: bool,
    pub renewable: bool,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub subscription_count: i64,
}

/// Input for creating a plan.
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub name: String,
    pub billing_period: BillingPeriod,
    pub price: Decimal,
    pub description: Option<String>,
    pub auto_close: bool,
    pub closable: bool,
    pub pausable: bool,
    pub renewable: bool,
}

/// Input for updating a plan.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub billing_period: Option<BillingPeriod>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub auto_close: Option<bool>,
    pub closable: Option<bool>,
    pub pausable: Option<bool>,
    pub renewable: Option<bool>,
    pub is_active: Option<bool>,
}
