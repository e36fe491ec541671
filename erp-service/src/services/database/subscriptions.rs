//! Subscription operations. A subscription and its nested lines are written
//! inside one transaction.

use super::{map_db_err, map_insert_err, Database};
use crate::models::{
    CreateSubscription, LineWithProductRow, Subscription, SubscriptionDetailRow, SubscriptionLine,
    UpdateSubscription,
};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const SUBSCRIPTION_COLUMNS: &str = "subscription_id, subscription_number, customer_id, plan_id, \
     start_date, expiration_date, status, created_utc, updated_utc";

impl Database {
    /// Create a subscription together with its lines.
    #[instrument(skip(self, input), fields(subscription_number = %input.subscription_number))]
    pub async fn create_subscription(
        &self,
        input: &CreateSubscription,
    ) -> Result<Subscription, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_subscription"])
            .start_timer();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_db_err(e, "begin subscription transaction"))?;

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions (subscription_id, subscription_number, customer_id, plan_id,
                                       start_date, expiration_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&input.subscription_number)
        .bind(input.customer_id)
        .bind(input.plan_id)
        .bind(input.start_date)
        .bind(input.expiration_date)
        .bind(input.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_err(e, "A subscription with this number"))?;

        for line in &input.lines {
            sqlx::query(
                "INSERT INTO subscription_lines (line_id, subscription_id, product_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(subscription.subscription_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_err(e, "create subscription line"))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_err(e, "commit subscription transaction"))?;

        timer.observe_duration();

        info!(
            subscription_id = %subscription.subscription_id,
            lines = input.lines.len(),
            "Subscription created"
        );

        Ok(subscription)
    }

    /// List subscriptions (optionally a single one) joined with customer,
    /// user and plan data, newest first.
    #[instrument(skip(self))]
    pub async fn list_subscription_details(
        &self,
        subscription_id: Option<Uuid>,
    ) -> Result<Vec<SubscriptionDetailRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_subscriptions"])
            .start_timer();

        let subscriptions = sqlx::query_as::<_, SubscriptionDetailRow>(
            r#"
            SELECT s.subscription_id, s.subscription_number, s.customer_id, s.plan_id,
                   s.start_date, s.expiration_date, s.status, s.created_utc, s.updated_utc,
                   u.first_name, u.last_name, u.email,
                   p.name AS plan_name, p.billing_period, p.price AS plan_price
            FROM subscriptions s
            JOIN customers c ON c.customer_id = s.customer_id
            JOIN users u ON u.user_id = c.user_id
            LEFT JOIN recurring_plans p ON p.plan_id = s.plan_id
            WHERE $1::uuid IS NULL OR s.subscription_id = $1
            ORDER BY s.created_utc DESC
            "#,
        )
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list subscriptions"))?;

        timer.observe_duration();

        Ok(subscriptions)
    }

    /// Lines of the given subscriptions joined with their products.
    #[instrument(skip(self, subscription_ids))]
    pub async fn lines_with_products(
        &self,
        subscription_ids: &[Uuid],
    ) -> Result<Vec<LineWithProductRow>, AppError> {
        let lines = sqlx::query_as::<_, LineWithProductRow>(
            r#"
            SELECT l.line_id, l.subscription_id, l.product_id, l.quantity, l.unit_price,
                   l.created_utc,
                   pr.name AS product_name, pr.description AS product_description, pr.sales_price
            FROM subscription_lines l
            JOIN products pr ON pr.product_id = l.product_id
            WHERE l.subscription_id = ANY($1)
            ORDER BY l.created_utc
            "#,
        )
        .bind(subscription_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list subscription lines"))?;

        Ok(lines)
    }

    /// Lines of a single subscription.
    #[instrument(skip(self))]
    pub async fn subscription_lines(
        &self,
        subscription_id: Uuid,
    ) -> Result<Vec<SubscriptionLine>, AppError> {
        let lines = sqlx::query_as::<_, SubscriptionLine>(
            "SELECT line_id, subscription_id, product_id, quantity, unit_price, created_utc \
             FROM subscription_lines WHERE subscription_id = $1 ORDER BY created_utc",
        )
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list subscription lines"))?;

        Ok(lines)
    }

    /// Get a subscription by id.
    #[instrument(skip(self))]
    pub async fn get_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscription_id = $1"
        ))
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get subscription"))?;

        Ok(subscription)
    }

    /// Update a subscription's status, plan or expiration date. Lines are
    /// not altered by this path.
    #[instrument(skip(self, input))]
    pub async fn update_subscription(
        &self,
        subscription_id: Uuid,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_subscription"])
            .start_timer();

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET status = COALESCE($2, status),
                plan_id = COALESCE($3, plan_id),
                expiration_date = COALESCE($4, expiration_date),
                updated_utc = now()
            WHERE subscription_id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#,
        ))
        .bind(subscription_id)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.plan_id)
        .bind(input.expiration_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update subscription"))?;

        timer.observe_duration();

        Ok(subscription)
    }

    /// Delete a subscription; its lines cascade. Invoices keep their
    /// denormalized customer and a nulled subscription reference.
    #[instrument(skip(self))]
    pub async fn delete_subscription(&self, subscription_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE subscription_id = $1")
            .bind(subscription_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "delete subscription"))?;

        Ok(result.rows_affected() > 0)
    }
}
