//! Read-only aggregate queries behind the dashboard.

use super::{map_db_err, Database};
use chrono::{DateTime, Utc};
use erp_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::instrument;
use uuid::Uuid;

/// Recent subscription entry for the activity feed.
#[derive(Debug, Clone, FromRow)]
pub struct RecentSubscriptionRow {
    pub subscription_id: Uuid,
    pub subscription_number: String,
    pub first_name: String,
    pub last_name: String,
    pub created_utc: DateTime<Utc>,
}

/// Recent invoice entry for the activity feed.
#[derive(Debug, Clone, FromRow)]
pub struct RecentInvoiceRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub total_amount: Decimal,
    pub first_name: String,
    pub last_name: String,
    pub created_utc: DateTime<Utc>,
}

impl Database {
    /// Number of running subscriptions.
    #[instrument(skip(self))]
    pub async fn count_running_subscriptions(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE status = 'RUNNING'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "count running subscriptions"))
    }

    /// Revenue: sum of totals over paid invoices.
    #[instrument(skip(self))]
    pub async fn sum_paid_invoice_totals(&self) -> Result<Decimal, AppError> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM invoices WHERE status = 'PAID'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "sum paid invoices"))
    }

    /// Invoices awaiting payment (draft or confirmed).
    #[instrument(skip(self))]
    pub async fn count_pending_invoices(&self) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE status IN ('CONFIRMED', 'DRAFT')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "count pending invoices"))
    }

    /// Total number of customers.
    #[instrument(skip(self))]
    pub async fn count_customers(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "count customers"))
    }

    /// Total number of products.
    #[instrument(skip(self))]
    pub async fn count_products(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "count products"))
    }

    /// Number of active plans.
    #[instrument(skip(self))]
    pub async fn count_active_plans(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM recurring_plans WHERE is_active = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "count active plans"))
    }

    /// Number of active taxes.
    #[instrument(skip(self))]
    pub async fn count_active_taxes(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM taxes WHERE is_active = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "count active taxes"))
    }

    /// Most recently created subscriptions.
    #[instrument(skip(self))]
    pub async fn recent_subscriptions(
        &self,
        limit: i64,
    ) -> Result<Vec<RecentSubscriptionRow>, AppError> {
        sqlx::query_as::<_, RecentSubscriptionRow>(
            r#"
            SELECT s.subscription_id, s.subscription_number,
                   u.first_name, u.last_name, s.created_utc
            FROM subscriptions s
            JOIN customers c ON c.customer_id = s.customer_id
            JOIN users u ON u.user_id = c.user_id
            ORDER BY s.created_utc DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list recent subscriptions"))
    }

    /// Most recently created invoices.
    #[instrument(skip(self))]
    pub async fn recent_invoices(&self, limit: i64) -> Result<Vec<RecentInvoiceRow>, AppError> {
        sqlx::query_as::<_, RecentInvoiceRow>(
            r#"
            SELECT i.invoice_id, i.invoice_number, i.total_amount,
                   u.first_name, u.last_name, i.created_utc
            FROM invoices i
            JOIN customers c ON c.customer_id = i.customer_id
            JOIN users u ON u.user_id = c.user_id
            ORDER BY i.created_utc DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list recent invoices"))
    }
}
