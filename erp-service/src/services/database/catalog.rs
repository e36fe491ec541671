//! Catalog operations: products, recurring plans, taxes and discounts.

use super::{map_db_err, map_insert_err, Database};
use crate::models::{
    CreateDiscount, CreatePlan, CreateProduct, CreateTax, Discount, PlanWithStats, Product,
    ProductWithStats, RecurringPlan, Tax, UpdateDiscount, UpdatePlan, UpdateProduct, UpdateTax,
};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "product_id, name, product_type, description, sales_price, \
     cost_price, is_active, created_utc, updated_utc";

const PLAN_COLUMNS: &str = "plan_id, name, billing_period, price, description, auto_close, \
     closable, pausable, renewable, is_active, created_utc, updated_utc";

const TAX_COLUMNS: &str = "tax_id, name, tax_type, rate, is_active, created_utc, updated_utc";

const DISCOUNT_COLUMNS: &str = "discount_id, name, code, discount_type, value, start_date, \
     end_date, is_active, created_utc, updated_utc";

impl Database {
    // -------------------------------------------------------------------------
    // Product Operations
    // -------------------------------------------------------------------------

    /// Create a new product.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &CreateProduct) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (product_id, name, product_type, description, sales_price, cost_price, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.product_type.as_str())
        .bind(&input.description)
        .bind(input.sales_price)
        .bind(input.cost_price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "Product"))?;

        timer.observe_duration();

        info!(product_id = %product.product_id, name = %product.name, "Product created");

        Ok(product)
    }

    /// List all products with line-usage counts, newest first.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductWithStats>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, ProductWithStats>(
            r#"
            SELECT p.product_id, p.name, p.product_type, p.description, p.sales_price,
                   p.cost_price, p.is_active, p.created_utc, p.updated_utc,
                   COUNT(l.line_id) AS line_count
            FROM products p
            LEFT JOIN subscription_lines l ON l.product_id = p.product_id
            GROUP BY p.product_id
            ORDER BY p.created_utc DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list products"))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Get a product by id.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get product"))?;

        Ok(product)
    }

    /// Update a product. Absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                product_type = COALESCE($3, product_type),
                description = COALESCE($4, description),
                sales_price = COALESCE($5, sales_price),
                cost_price = COALESCE($6, cost_price),
                is_active = COALESCE($7, is_active),
                updated_utc = now()
            WHERE product_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(product_id)
        .bind(&input.name)
        .bind(input.product_type.map(|t| t.as_str()))
        .bind(&input.description)
        .bind(input.sales_price)
        .bind(input.cost_price)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update product"))?;

        Ok(product)
    }

    /// Delete a product.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "delete product"))?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Plan Operations
    // -------------------------------------------------------------------------

    /// Create a new recurring plan.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_plan(&self, input: &CreatePlan) -> Result<RecurringPlan, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_plan"])
            .start_timer();

        let plan = sqlx::query_as::<_, RecurringPlan>(&format!(
            r#"
            INSERT INTO recurring_plans (plan_id, name, billing_period, price, description,
                                         auto_close, closable, pausable, renewable, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            RETURNING {PLAN_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.billing_period.as_str())
        .bind(input.price)
        .bind(&input.description)
        .bind(input.auto_close)
        .bind(input.closable)
        .bind(input.pausable)
        .bind(input.renewable)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "Plan"))?;

        timer.observe_duration();

        info!(plan_id = %plan.plan_id, name = %plan.name, "Plan created");

        Ok(plan)
    }

    /// List all plans with subscription counts, newest first.
    #[instrument(skip(self))]
    pub async fn list_plans(&self) -> Result<Vec<PlanWithStats>, AppError> {
        let plans = sqlx::query_as::<_, PlanWithStats>(
            r#"
            SELECT p.plan_id, p.name, p.billing_period, p.price, p.description,
                   p.auto_close, p.closable, p.pausable, p.renewable, p.is_active,
                   p.created_utc, p.updated_utc,
                   COUNT(s.subscription_id) AS subscription_count
            FROM recurring_plans p
            LEFT JOIN subscriptions s ON s.plan_id = p.plan_id
            GROUP BY p.plan_id
            ORDER BY p.created_utc DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list plans"))?;

        Ok(plans)
    }

    /// Get a plan by id.
    #[instrument(skip(self))]
    pub async fn get_plan(&self, plan_id: Uuid) -> Result<Option<RecurringPlan>, AppError> {
        let plan = sqlx::query_as::<_, RecurringPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM recurring_plans WHERE plan_id = $1"
        ))
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get plan"))?;

        Ok(plan)
    }

    /// Update a plan. Absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_plan(
        &self,
        plan_id: Uuid,
        input: &UpdatePlan,
    ) -> Result<Option<RecurringPlan>, AppError> {
        let plan = sqlx::query_as::<_, RecurringPlan>(&format!(
            r#"
            UPDATE recurring_plans
            SET name = COALESCE($2, name),
                billing_period = COALESCE($3, billing_period),
                price = COALESCE($4, price),
                description = COALESCE($5, description),
                auto_close = COALESCE($6, auto_close),
                closable = COALESCE($7, closable),
                pausable = COALESCE($8, pausable),
                renewable = COALESCE($9, renewable),
                is_active = COALESCE($10, is_active),
                updated_utc = now()
            WHERE plan_id = $1
            RETURNING {PLAN_COLUMNS}
            "#,
        ))
        .bind(plan_id)
        .bind(&input.name)
        .bind(input.billing_period.map(|b| b.as_str()))
        .bind(input.price)
        .bind(&input.description)
        .bind(input.auto_close)
        .bind(input.closable)
        .bind(input.pausable)
        .bind(input.renewable)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update plan"))?;

        Ok(plan)
    }

    /// Delete a plan.
    #[instrument(skip(self))]
    pub async fn delete_plan(&self, plan_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recurring_plans WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "delete plan"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Price of a plan, when it exists.
    #[instrument(skip(self))]
    pub async fn plan_price(&self, plan_id: Uuid) -> Result<Option<Decimal>, AppError> {
        let price = sqlx::query_scalar::<_, Decimal>(
            "SELECT price FROM recurring_plans WHERE plan_id = $1",
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get plan price"))?;

        Ok(price)
    }

    // -------------------------------------------------------------------------
    // Tax Operations
    // -------------------------------------------------------------------------

    /// Create a new tax rule.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_tax(&self, input: &CreateTax) -> Result<Tax, AppError> {
        let tax = sqlx::query_as::<_, Tax>(&format!(
            r#"
            INSERT INTO taxes (tax_id, name, tax_type, rate, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING {TAX_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.tax_type)
        .bind(input.rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "Tax"))?;

        info!(tax_id = %tax.tax_id, name = %tax.name, "Tax created");

        Ok(tax)
    }

    /// List all taxes, newest first.
    #[instrument(skip(self))]
    pub async fn list_taxes(&self) -> Result<Vec<Tax>, AppError> {
        let taxes = sqlx::query_as::<_, Tax>(&format!(
            "SELECT {TAX_COLUMNS} FROM taxes ORDER BY created_utc DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list taxes"))?;

        Ok(taxes)
    }

    /// Update a tax rule. Absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_tax(
        &self,
        tax_id: Uuid,
        input: &UpdateTax,
    ) -> Result<Option<Tax>, AppError> {
        let tax = sqlx::query_as::<_, Tax>(&format!(
            r#"
            UPDATE taxes
            SET name = COALESCE($2, name),
                tax_type = COALESCE($3, tax_type),
                rate = COALESCE($4, rate),
                is_active = COALESCE($5, is_active),
                updated_utc = now()
            WHERE tax_id = $1
            RETURNING {TAX_COLUMNS}
            "#,
        ))
        .bind(tax_id)
        .bind(&input.name)
        .bind(&input.tax_type)
        .bind(input.rate)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update tax"))?;

        Ok(tax)
    }

    /// Delete a tax rule.
    #[instrument(skip(self))]
    pub async fn delete_tax(&self, tax_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM taxes WHERE tax_id = $1")
            .bind(tax_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "delete tax"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Rates of active percentage taxes, applied to invoice subtotals.
    #[instrument(skip(self))]
    pub async fn active_percentage_tax_rates(&self) -> Result<Vec<Decimal>, AppError> {
        let rates = sqlx::query_scalar::<_, Decimal>(
            "SELECT rate FROM taxes WHERE is_active = TRUE AND tax_type = 'PERCENTAGE'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list active tax rates"))?;

        Ok(rates)
    }

    // -------------------------------------------------------------------------
    // Discount Operations
    // -------------------------------------------------------------------------

    /// Create a new discount.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_discount(&self, input: &CreateDiscount) -> Result<Discount, AppError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            r#"
            INSERT INTO discounts (discount_id, name, code, discount_type, value, start_date, end_date, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {DISCOUNT_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.code)
        .bind(&input.discount_type)
        .bind(input.value)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "A discount with this code"))?;

        info!(discount_id = %discount.discount_id, code = %discount.code, "Discount created");

        Ok(discount)
    }

    /// List all discounts, newest first.
    #[instrument(skip(self))]
    pub async fn list_discounts(&self) -> Result<Vec<Discount>, AppError> {
        let discounts = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY created_utc DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list discounts"))?;

        Ok(discounts)
    }

    /// Update a discount. Absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_discount(
        &self,
        discount_id: Uuid,
        input: &UpdateDiscount,
    ) -> Result<Option<Discount>, AppError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            r#"
            UPDATE discounts
            SET name = COALESCE($2, name),
                code = COALESCE($3, code),
                discount_type = COALESCE($4, discount_type),
                value = COALESCE($5, value),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date),
                is_active = COALESCE($8, is_active),
                updated_utc = now()
            WHERE discount_id = $1
            RETURNING {DISCOUNT_COLUMNS}
            "#,
        ))
        .bind(discount_id)
        .bind(&input.name)
        .bind(&input.code)
        .bind(&input.discount_type)
        .bind(input.value)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update discount"))?;

        Ok(discount)
    }

    /// Delete a discount.
    #[instrument(skip(self))]
    pub async fn delete_discount(&self, discount_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM discounts WHERE discount_id = $1")
            .bind(discount_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "delete discount"))?;

        Ok(result.rows_affected() > 0)
    }
}
