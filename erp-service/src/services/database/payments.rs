//! Payment operations.

use super::{map_db_err, map_insert_err, Database};
use crate::models::{CreatePayment, Payment, PaymentWithInvoiceRow, UpdatePayment};
use crate::services::metrics::{DB_QUERY_DURATION, PAYMENTS_TOTAL};
use erp_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const PAYMENT_COLUMNS: &str =
    "payment_id, invoice_id, amount, payment_method, payment_date, reference, created_utc";

impl Database {
    /// Record a payment against an invoice.
    #[instrument(skip(self, input), fields(invoice_id = %input.invoice_id))]
    pub async fn create_payment(&self, input: &CreatePayment) -> Result<Payment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_payment"])
            .start_timer();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (payment_id, invoice_id, amount, payment_method, payment_date, reference)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(input.invoice_id)
        .bind(input.amount)
        .bind(input.payment_method.as_str())
        .bind(input.payment_date)
        .bind(&input.reference)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "Payment"))?;

        timer.observe_duration();

        PAYMENTS_TOTAL
            .with_label_values(&[input.payment_method.as_str()])
            .inc();

        info!(
            payment_id = %payment.payment_id,
            invoice_id = %payment.invoice_id,
            amount = %payment.amount,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Get a payment by id.
    #[instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get payment"))?;

        Ok(payment)
    }

    /// List all payments joined with invoice and customer data, most recent
    /// payment date first.
    #[instrument(skip(self))]
    pub async fn list_payments_with_invoice(
        &self,
    ) -> Result<Vec<PaymentWithInvoiceRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, PaymentWithInvoiceRow>(
            r#"
            SELECT p.payment_id, p.invoice_id, p.amount, p.payment_method, p.payment_date,
                   p.reference, p.created_utc,
                   i.invoice_number, i.status AS invoice_status,
                   u.first_name, u.last_name, u.email
            FROM payments p
            JOIN invoices i ON i.invoice_id = p.invoice_id
            JOIN customers c ON c.customer_id = i.customer_id
            JOIN users u ON u.user_id = c.user_id
            ORDER BY p.payment_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list payments"))?;

        timer.observe_duration();

        Ok(payments)
    }

    /// Get a payment joined with invoice and customer data.
    #[instrument(skip(self))]
    pub async fn get_payment_with_invoice(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<PaymentWithInvoiceRow>, AppError> {
        let payment = sqlx::query_as::<_, PaymentWithInvoiceRow>(
            r#"
            SELECT p.payment_id, p.invoice_id, p.amount, p.payment_method, p.payment_date,
                   p.reference, p.created_utc,
                   i.invoice_number, i.status AS invoice_status,
                   u.first_name, u.last_name, u.email
            FROM payments p
            JOIN invoices i ON i.invoice_id = p.invoice_id
            JOIN customers c ON c.customer_id = i.customer_id
            JOIN users u ON u.user_id = c.user_id
            WHERE p.payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "get payment"))?;

        Ok(payment)
    }

    /// Update a payment. Absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_payment(
        &self,
        payment_id: Uuid,
        input: &UpdatePayment,
    ) -> Result<Option<Payment>, AppError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET amount = COALESCE($2, amount),
                payment_method = COALESCE($3, payment_method),
                reference = COALESCE($4, reference)
            WHERE payment_id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(payment_id)
        .bind(input.amount)
        .bind(input.payment_method.map(|m| m.as_str()))
        .bind(&input.reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update payment"))?;

        Ok(payment)
    }

    /// Delete a payment; returns the invoice it belonged to so the caller
    /// can settle it.
    #[instrument(skip(self))]
    pub async fn delete_payment(&self, payment_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let invoice_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM payments WHERE payment_id = $1 RETURNING invoice_id",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "delete payment"))?;

        Ok(invoice_id)
    }
}
