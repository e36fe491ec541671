//! Dashboard aggregation. The independent read-only queries run
//! concurrently; nothing is cached between requests.

use axum::{extract::State, Json};
use rust_decimal::Decimal;

use crate::{
    dtos::dashboard::{
        merge_activity_feed, ActivityEntry, DashboardResponse, DashboardStats, SystemCounts,
    },
    middleware::AuthUser,
    services::policy::{self, Capability},
    startup::AppState,
};
use erp_core::error::AppError;

/// Aggregated KPIs plus the merged recent-activity feed.
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    policy::require(&user.0.role, Capability::ViewDashboard)?;

    let db = &state.db;
    let (
        active_subscriptions,
        total_revenue,
        pending_invoices,
        total_customers,
        recent_subscriptions,
        recent_invoices,
        products,
        active_plans,
        active_taxes,
    ) = tokio::try_join!(
        db.count_running_subscriptions(),
        db.sum_paid_invoice_totals(),
        db.count_pending_invoices(),
        db.count_customers(),
        db.recent_subscriptions(3),
        db.recent_invoices(3),
        db.count_products(),
        db.count_active_plans(),
        db.count_active_taxes(),
    )?;

    let mut activity: Vec<ActivityEntry> = Vec::new();
    activity.extend(recent_subscriptions.into_iter().map(|s| ActivityEntry {
        id: s.subscription_id,
        entry_type: "subscription".to_string(),
        title: format!("New subscription #{}", s.subscription_number),
        description: format!("{} {}", s.first_name, s.last_name),
        amount: Decimal::ZERO,
        date: s.created_utc,
    }));
    activity.extend(recent_invoices.into_iter().map(|i| ActivityEntry {
        id: i.invoice_id,
        entry_type: "invoice".to_string(),
        title: format!("Invoice #{} generated", i.invoice_number),
        description: format!("{} {}", i.first_name, i.last_name),
        amount: i.total_amount,
        date: i.created_utc,
    }));

    Ok(Json(DashboardResponse {
        stats: DashboardStats {
            active_subscriptions,
            total_revenue,
            pending_invoices,
            total_customers,
        },
        activity: merge_activity_feed(activity),
        system: SystemCounts {
            products,
            active_plans,
            active_taxes,
        },
    }))
}
