//! Customer operations. A customer and its user account are written inside
//! one transaction; deleting a customer removes the user row, which
//! cascades back over the customer.

use super::{map_db_err, map_insert_err, Database};
use crate::models::{
    CreateCustomer, CreateUser, Customer, CustomerSubscriptionSummary, CustomerWithUser,
    UpdateCustomer, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str = "customer_id, user_id, company_name, phone, address, city, \
     state, postal_code, country, created_utc, updated_utc";

const CUSTOMER_WITH_USER: &str = "c.customer_id, c.user_id, c.company_name, c.phone, \
     c.address, c.city, c.state, c.postal_code, c.country, c.created_utc, c.updated_utc, \
     u.email, u.first_name, u.last_name, u.is_active";

impl Database {
    /// Create a customer together with its user account.
    #[instrument(skip(self, user, profile), fields(email = %user.email))]
    pub async fn create_customer(
        &self,
        user: &CreateUser,
        profile: &CreateCustomer,
    ) -> Result<(Customer, User), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_db_err(e, "begin customer transaction"))?;

        let created_user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, email, password_hash, first_name, last_name, role, is_active, created_by)
            VALUES ($1, lower($2), $3, $4, $5, $6, TRUE, $7)
            RETURNING user_id, email, password_hash, first_name, last_name, role,
                      is_active, reset_token, reset_token_expiry, created_by, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_err(e, "A user with this email"))?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (customer_id, user_id, company_name, phone, address, city, state, postal_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CUSTOMER_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(created_user.user_id)
        .bind(&profile.company_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.postal_code)
        .bind(&profile.country)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_err(e, "Customer"))?;

        tx.commit()
            .await
            .map_err(|e| map_db_err(e, "commit customer transaction"))?;

        timer.observe_duration();

        info!(customer_id = %customer.customer_id, user_id = %created_user.user_id, "Customer created");

        Ok((customer, created_user))
    }

    /// List all customers with their user accounts, newest first.
    #[instrument(skip(self))]
    pub async fn list_customers_with_users(&self) -> Result<Vec<CustomerWithUser>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, CustomerWithUser>(&format!(
            r#"
            SELECT {CUSTOMER_WITH_USER}
            FROM customers c
            JOIN users u ON u.user_id = c.user_id
            ORDER BY c.created_utc DESC
            "#,
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list customers"))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Get a single customer with its user account.
    #[instrument(skip(self))]
    pub async fn get_customer_with_user(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerWithUser>, AppError> {
        let customer = sqlx::query_as::<_, CustomerWithUser>(&format!(
            r#"
            SELECT {CUSTOMER_WITH_USER}
            FROM customers c
            JOIN users u ON u.user_id = c.user_id
            WHERE c.customer_id = $1
            "#,
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get customer"))?;

        Ok(customer)
    }

    /// Check that a customer exists.
    #[instrument(skip(self))]
    pub async fn find_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customer_id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "find customer"))?;

        Ok(customer)
    }

    /// Update a customer profile and, when names are supplied, its user.
    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<CustomerWithUser>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_db_err(e, "begin customer transaction"))?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET company_name = COALESCE($2, company_name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                city = COALESCE($5, city),
                state = COALESCE($6, state),
                postal_code = COALESCE($7, postal_code),
                country = COALESCE($8, country),
                updated_utc = now()
            WHERE customer_id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#,
        ))
        .bind(customer_id)
        .bind(&input.company_name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(&input.country)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_err(e, "update customer"))?;

        let Some(customer) = customer else {
            return Ok(None);
        };

        if input.first_name.is_some() || input.last_name.is_some() {
            sqlx::query(
                "UPDATE users SET first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), updated_utc = now() WHERE user_id = $1",
            )
            .bind(customer.user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_err(e, "update customer user"))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_err(e, "commit customer transaction"))?;

        timer.observe_duration();

        self.get_customer_with_user(customer_id).await
    }

    /// Delete a customer. The user row is removed, cascading the customer.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM users WHERE user_id = \
             (SELECT user_id FROM customers WHERE customer_id = $1)",
        )
        .bind(customer_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "delete customer"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Per-subscription line totals grouped by customer, for the list view.
    #[instrument(skip(self))]
    pub async fn subscription_summaries_by_customer(
        &self,
    ) -> Result<Vec<CustomerSubscriptionSummary>, AppError> {
        let summaries = sqlx::query_as::<_, CustomerSubscriptionSummary>(
            r#"
            SELECT s.customer_id, s.subscription_id, s.status,
                   COALESCE(SUM(l.quantity * l.unit_price), 0) AS total_amount
            FROM subscriptions s
            LEFT JOIN subscription_lines l ON l.subscription_id = s.subscription_id
            GROUP BY s.customer_id, s.subscription_id, s.status
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "summarize customer subscriptions"))?;

        Ok(summaries)
    }
}
