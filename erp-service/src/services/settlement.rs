//! Settlement arithmetic for the subscription -> invoice -> payment flow.
//!
//! Everything here is pure; the only I/O entry point is [`settle_invoice`],
//! which re-derives an invoice's status after a payment mutation.

use crate::models::InvoiceStatus;
use crate::services::Database;
use chrono::{NaiveDate, Utc};
use erp_core::error::AppError;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Computed invoice totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Total amount of a subscription: the sum of `quantity x unit_price` over
/// its lines when lines exist, else the plan price, else zero.
pub fn subscription_total(lines: &[(i32, Decimal)], plan_price: Option<Decimal>) -> Decimal {
    if !lines.is_empty() {
        lines
            .iter()
            .map(|(quantity, unit_price)| Decimal::from(*quantity) * *unit_price)
            .sum()
    } else {
        plan_price.unwrap_or_default()
    }
}

/// Invoice totals from a subtotal and the active percentage tax rates.
/// Tax is rounded to cents.
pub fn invoice_totals(subtotal: Decimal, percentage_rates: &[Decimal]) -> InvoiceTotals {
    let tax_amount: Decimal = percentage_rates
        .iter()
        .map(|rate| (subtotal * *rate / Decimal::ONE_HUNDRED).round_dp(2))
        .sum();
    InvoiceTotals {
        subtotal,
        tax_amount,
        total_amount: subtotal + tax_amount,
    }
}

/// Derive an invoice status from its payment state.
///
/// Payments covering the total settle the invoice as PAID; dropping back
/// below the total (a deleted or shrunk payment) reverts PAID to CONFIRMED.
/// An open invoice past its due date becomes OVERDUE. CANCELLED is terminal.
pub fn derive_invoice_status(
    current: InvoiceStatus,
    total_amount: Decimal,
    amount_paid: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
) -> InvoiceStatus {
    if current == InvoiceStatus::Cancelled {
        return InvoiceStatus::Cancelled;
    }
    if total_amount > Decimal::ZERO && amount_paid >= total_amount {
        return InvoiceStatus::Paid;
    }
    let current = if current == InvoiceStatus::Paid {
        InvoiceStatus::Confirmed
    } else {
        current
    };
    if due_date < today {
        return InvoiceStatus::Overdue;
    }
    if current == InvoiceStatus::Overdue {
        // Due date moved forward again; treat as confirmed and collectable.
        return InvoiceStatus::Confirmed;
    }
    current
}

/// Re-derive and persist the status of an invoice from its payments.
/// Invoked after every payment mutation and after invoice total updates.
pub async fn settle_invoice(db: &Database, invoice_id: Uuid) -> Result<(), AppError> {
    let Some(invoice) = db.get_invoice(invoice_id).await? else {
        // The invoice was deleted out from under the payment mutation;
        // nothing left to settle.
        return Ok(());
    };

    let amount_paid = db.sum_payments(invoice_id).await?;
    let current = InvoiceStatus::from_string(&invoice.status);
    let derived = derive_invoice_status(
        current,
        invoice.total_amount,
        amount_paid,
        invoice.due_date,
        Utc::now().date_naive(),
    );

    if derived != current {
        tracing::info!(
            invoice_id = %invoice_id,
            from = current.as_str(),
            to = derived.as_str(),
            amount_paid = %amount_paid,
            total_amount = %invoice.total_amount,
            "Invoice status settled"
        );
        db.set_invoice_status(invoice_id, derived).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn line_totals_sum_quantity_times_price() {
        let lines = vec![(2, dec("10")), (1, dec("5"))];
        assert_eq!(subscription_total(&lines, None), dec("25"));
    }

    #[test]
    fn empty_lines_fall_back_to_plan_price() {
        assert_eq!(subscription_total(&[], Some(dec("99.99"))), dec("99.99"));
    }

    #[test]
    fn no_lines_and_no_plan_totals_zero() {
        assert_eq!(subscription_total(&[], None), Decimal::ZERO);
    }

    #[test]
    fn plan_price_ignored_when_lines_exist() {
        let lines = vec![(3, dec("4"))];
        assert_eq!(subscription_total(&lines, Some(dec("99.99"))), dec("12"));
    }

    #[test]
    fn percentage_taxes_apply_to_subtotal() {
        let totals = invoice_totals(dec("100"), &[dec("10"), dec("5")]);
        assert_eq!(totals.subtotal, dec("100"));
        assert_eq!(totals.tax_amount, dec("15"));
        assert_eq!(totals.total_amount, dec("115"));
    }

    #[test]
    fn tax_rounds_to_cents() {
        let totals = invoice_totals(dec("33.33"), &[dec("7.5")]);
        assert_eq!(totals.tax_amount, dec("2.50"));
        assert_eq!(totals.total_amount, dec("35.83"));
    }

    #[test]
    fn no_taxes_means_total_equals_subtotal() {
        let totals = invoice_totals(dec("42"), &[]);
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec("42"));
    }

    #[test]
    fn full_payment_settles_as_paid() {
        let status = derive_invoice_status(
            InvoiceStatus::Confirmed,
            dec("100"),
            dec("100"),
            date(2026, 9, 1),
            date(2026, 8, 1),
        );
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn overpayment_still_settles_as_paid() {
        let status = derive_invoice_status(
            InvoiceStatus::Sent,
            dec("100"),
            dec("150"),
            date(2026, 9, 1),
            date(2026, 8, 1),
        );
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn partial_payment_leaves_status_alone() {
        let status = derive_invoice_status(
            InvoiceStatus::Confirmed,
            dec("100"),
            dec("40"),
            date(2026, 9, 1),
            date(2026, 8, 1),
        );
        assert_eq!(status, InvoiceStatus::Confirmed);
    }

    #[test]
    fn deleted_payment_reverts_paid_to_confirmed() {
        let status = derive_invoice_status(
            InvoiceStatus::Paid,
            dec("100"),
            dec("40"),
            date(2026, 9, 1),
            date(2026, 8, 1),
        );
        assert_eq!(status, InvoiceStatus::Confirmed);
    }

    #[test]
    fn open_invoice_past_due_becomes_overdue() {
        let status = derive_invoice_status(
            InvoiceStatus::Sent,
            dec("100"),
            dec("40"),
            date(2026, 7, 1),
            date(2026, 8, 1),
        );
        assert_eq!(status, InvoiceStatus::Overdue);
    }

    #[test]
    fn cancelled_is_terminal_even_when_paid() {
        let status = derive_invoice_status(
            InvoiceStatus::Cancelled,
            dec("100"),
            dec("100"),
            date(2026, 9, 1),
            date(2026, 8, 1),
        );
        assert_eq!(status, InvoiceStatus::Cancelled);
    }

    #[test]
    fn zero_total_never_settles_as_paid() {
        let status = derive_invoice_status(
            InvoiceStatus::Draft,
            Decimal::ZERO,
            Decimal::ZERO,
            date(2026, 9, 1),
            date(2026, 8, 1),
        );
        assert_eq!(status, InvoiceStatus::Draft);
    }
}
