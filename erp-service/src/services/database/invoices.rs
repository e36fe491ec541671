//! Invoice operations.

use super::{map_db_err, map_insert_err, Database};
use crate::models::{
    CreateInvoice, Invoice, InvoiceStatus, InvoiceWithCustomerRow, Payment, UpdateInvoice,
};
use crate::services::metrics::{DB_QUERY_DURATION, INVOICES_TOTAL};
use erp_core::error::AppError;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

const INVOICE_COLUMNS: &str = "invoice_id, invoice_number, subscription_id, customer_id, \
     invoice_date, due_date, status, subtotal, tax_amount, total_amount, created_utc, updated_utc";

const PAYMENT_COLUMNS: &str =
    "payment_id, invoice_id, amount, payment_method, payment_date, reference, created_utc";

impl Database {
    /// Create a new invoice with service-computed totals.
    #[instrument(skip(self, input), fields(invoice_number = %input.invoice_number))]
    pub async fn create_invoice(&self, input: &CreateInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (invoice_id, invoice_number, subscription_id, customer_id,
                                  invoice_date, due_date, status, subtotal, tax_amount, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&input.invoice_number)
        .bind(input.subscription_id)
        .bind(input.customer_id)
        .bind(input.invoice_date)
        .bind(input.due_date)
        .bind(input.status.as_str())
        .bind(input.subtotal)
        .bind(input.tax_amount)
        .bind(input.total_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "An invoice with this number"))?;

        timer.observe_duration();

        INVOICES_TOTAL
            .with_label_values(&[input.status.as_str()])
            .inc();

        info!(
            invoice_id = %invoice.invoice_id,
            total_amount = %invoice.total_amount,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Get an invoice by id.
    #[instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get invoice"))?;

        Ok(invoice)
    }

    /// List all invoices joined with the customer's user, newest first.
    #[instrument(skip(self))]
    pub async fn list_invoices_with_customer(
        &self,
    ) -> Result<Vec<InvoiceWithCustomerRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, InvoiceWithCustomerRow>(
            r#"
            SELECT i.invoice_id, i.invoice_number, i.subscription_id, i.customer_id,
                   i.invoice_date, i.due_date, i.status, i.subtotal, i.tax_amount,
                   i.total_amount, i.created_utc, i.updated_utc,
                   u.first_name, u.last_name, u.email
            FROM invoices i
            JOIN customers c ON c.customer_id = i.customer_id
            JOIN users u ON u.user_id = c.user_id
            ORDER BY i.created_utc DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list invoices"))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Get a single invoice joined with the customer's user.
    #[instrument(skip(self))]
    pub async fn get_invoice_with_customer(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceWithCustomerRow>, AppError> {
        let invoice = sqlx::query_as::<_, InvoiceWithCustomerRow>(
            r#"
            SELECT i.invoice_id, i.invoice_number, i.subscription_id, i.customer_id,
                   i.invoice_date, i.due_date, i.status, i.subtotal, i.tax_amount,
                   i.total_amount, i.created_utc, i.updated_utc,
                   u.first_name, u.last_name, u.email
            FROM invoices i
            JOIN customers c ON c.customer_id = i.customer_id
            JOIN users u ON u.user_id = c.user_id
            WHERE i.invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get invoice"))?;

        Ok(invoice)
    }

    /// Payments recorded against an invoice, newest first.
    #[instrument(skip(self))]
    pub async fn payments_for_invoice(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 \
             ORDER BY payment_date DESC"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list invoice payments"))?;

        Ok(payments)
    }

    /// Payments of the given invoices, for list assembly.
    #[instrument(skip(self, invoice_ids))]
    pub async fn payments_for_invoices(
        &self,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = ANY($1) \
             ORDER BY payment_date DESC"
        ))
        .bind(invoice_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list invoice payments"))?;

        Ok(payments)
    }

    /// Sum of payments recorded against an invoice.
    #[instrument(skip(self))]
    pub async fn sum_payments(&self, invoice_id: Uuid) -> Result<Decimal, AppError> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "sum invoice payments"))?;

        Ok(sum)
    }

    /// Update an invoice. Absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: &UpdateInvoice,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = COALESCE($2, status),
                subtotal = COALESCE($3, subtotal),
                tax_amount = COALESCE($4, tax_amount),
                total_amount = COALESCE($5, total_amount),
                due_date = COALESCE($6, due_date),
                updated_utc = now()
            WHERE invoice_id = $1
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.subtotal)
        .bind(input.tax_amount)
        .bind(input.total_amount)
        .bind(input.due_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update invoice"))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// Persist a settled invoice status.
    #[instrument(skip(self))]
    pub async fn set_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE invoices SET status = $2, updated_utc = now() WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "set invoice status"))?;

        Ok(())
    }

    /// Delete an invoice; its payments cascade.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "delete invoice"))?;

        Ok(result.rows_affected() > 0)
    }
}
