//! Subscription and subscription-line models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription status. Transition legality (DRAFT -> QUOTATION -> RUNNING
/// -> CLOSED, CANCELLED from any non-terminal state) is enforced by the UI;
/// the server stores whatever status the caller sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Draft,
    Quotation,
    Running,
    Paused,
    Cancelled,
    Closed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Draft => "DRAFT",
            SubscriptionStatus::Quotation => "QUOTATION",
            SubscriptionStatus::Running => "RUNNING",
            SubscriptionStatus::Paused => "PAUSED",
            SubscriptionStatus::Cancelled => "CANCELLED",
            SubscriptionStatus::Closed => "CLOSED",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "QUOTATION" => SubscriptionStatus::Quotation,
            // ACTIVE is the legacy spelling still used by older clients.
            "RUNNING" | "ACTIVE" => SubscriptionStatus::Running,
            "PAUSED" => SubscriptionStatus::Paused,
            "CANCELLED" => SubscriptionStatus::Cancelled,
            "CLOSED" => SubscriptionStatus::Closed,
            _ => SubscriptionStatus::Draft,
        }
    }
}

/// Subscription row. The total amount is never stored; it is recomputed on
/// every read from the lines, falling back to the plan price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "id")]
    pub subscription_id: Uuid,
    pub subscription_number: String,
    pub customer_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Subscription {
    /// Generate a subscription number from the current timestamp.
    /// Not collision-proof under same-millisecond concurrent creation; the
    /// unique index surfaces a conflict in that case.
    pub fn generate_number(now: DateTime<Utc>) -> String {
        format!("SUB-{}", now.timestamp_millis())
    }
}

/// Priced product entry within a subscription.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLine {
    #[serde(rename = "id")]
    pub line_id: Uuid,
    pub subscription_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Subscription joined with customer/user and plan data for read views.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionDetailRow {
    pub subscription_id: Uuid,
    pub subscription_number: String,
    pub customer_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub plan_name: Option<String>,
    pub billing_period: Option<String>,
    pub plan_price: Option<Decimal>,
}

/// Line joined with its product for read views.
#[derive(Debug, Clone, FromRow)]
pub struct LineWithProductRow {
    pub line_id: Uuid,
    pub subscription_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub created_utc: DateTime<Utc>,
    pub product_name: String,
    pub product_description: Option<String>,
    pub sales_price: Decimal,
}

/// Per-subscription summary used by the customer list view.
#[derive(Debug, Clone, FromRow)]
pub struct CustomerSubscriptionSummary {
    pub customer_id: Uuid,
    pub subscription_id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
}

/// Input for creating a subscription with nested lines.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub subscription_number: String,
    pub customer_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub lines: Vec<CreateSubscriptionLine>,
}

/// Nested line input.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Input for updating a subscription. Lines are not altered by this path.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscription {
    pub status: Option<SubscriptionStatus>,
    pub plan_id: Option<Uuid>,
    pub expiration_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_numbers_carry_the_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(Subscription::generate_number(at), "SUB-1700000000123");
    }

    #[test]
    fn distinct_timestamps_give_distinct_numbers() {
        let a = Utc.timestamp_millis_opt(1_700_000_000_001).unwrap();
        let b = Utc.timestamp_millis_opt(1_700_000_000_002).unwrap();
        assert_ne!(
            Subscription::generate_number(a),
            Subscription::generate_number(b)
        );
    }

    #[test]
    fn legacy_active_status_maps_to_running() {
        assert_eq!(
            SubscriptionStatus::from_string("ACTIVE"),
            SubscriptionStatus::Running
        );
        assert_eq!(
            SubscriptionStatus::from_string("bogus"),
            SubscriptionStatus::Draft
        );
    }
}
