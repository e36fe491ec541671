//! Subscription lifecycle endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    dtos::{
        subscription::{
            CreateSubscriptionRequest, SubscriptionLineResponse, SubscriptionResponse,
            UpdateSubscriptionRequest,
        },
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{
        CreateSubscription, CreateSubscriptionLine, Subscription, SubscriptionStatus,
        UpdateSubscription,
    },
    services::{
        policy::{self, Capability},
        settlement,
    },
    startup::AppState,
};
use erp_core::error::AppError;

/// Assemble read views for the given subscriptions: nested lines/products
/// and the per-subscription total, recomputed on every read.
async fn assemble_responses(
    state: &AppState,
    subscription_id: Option<Uuid>,
) -> Result<Vec<SubscriptionResponse>, AppError> {
    let rows = state.db.list_subscription_details(subscription_id).await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.subscription_id).collect();
    let mut lines_by_sub: HashMap<Uuid, Vec<SubscriptionLineResponse>> = HashMap::new();
    for line in state.db.lines_with_products(&ids).await? {
        lines_by_sub
            .entry(line.subscription_id)
            .or_default()
            .push(line.into());
    }

    let responses = rows
        .into_iter()
        .map(|row| {
            let lines = lines_by_sub.remove(&row.subscription_id).unwrap_or_default();
            let components: Vec<(i32, _)> =
                lines.iter().map(|l| (l.quantity, l.unit_price)).collect();
            let total = settlement::subscription_total(&components, row.plan_price);
            SubscriptionResponse::from_parts(row, lines, total)
        })
        .collect();

    Ok(responses)
}

/// List subscriptions, or a single one via `?id=`.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    let responses = assemble_responses(&state, query.id).await?;
    Ok(Json(responses))
}

/// Create a subscription with nested lines.
pub async fn create_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let customer_id = req
        .customer_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Customer is required")))?;

    if state.db.find_customer(customer_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }

    // Legacy clients still send recurringPlanId.
    let plan_id = req.plan_id.or(req.recurring_plan_id);

    let subscription_number = match req.subscription_number.as_deref() {
        None | Some("") | Some("Draft") => Subscription::generate_number(Utc::now()),
        Some(number) => number.to_string(),
    };

    let start_date = req.start_date.unwrap_or_else(|| Utc::now().date_naive());
    let expiration_date = req.end_date.unwrap_or(start_date + Duration::days(30));

    let mut lines = Vec::new();
    for line in req.lines.unwrap_or_default() {
        let (Some(product_id), Some(quantity), Some(unit_price)) =
            (line.product_id, line.quantity, line.unit_price)
        else {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Each line requires product, quantity, and unit price"
            )));
        };
        lines.push(CreateSubscriptionLine {
            product_id,
            quantity,
            unit_price,
        });
    }

    let subscription = state
        .db
        .create_subscription(&CreateSubscription {
            subscription_number,
            customer_id,
            plan_id,
            start_date,
            expiration_date,
            status: req
                .status
                .as_deref()
                .map(SubscriptionStatus::from_string)
                .unwrap_or(SubscriptionStatus::Draft),
            lines,
        })
        .await?;

    let response = assemble_responses(&state, Some(subscription.subscription_id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Update status, plan or expiration date. Lines are not altered here.
pub async fn update_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Subscription ID is required")))?;

    let plan_id = req.plan_id.or(req.recurring_plan_id);

    state
        .db
        .update_subscription(
            id,
            &UpdateSubscription {
                status: req.status.as_deref().map(SubscriptionStatus::from_string),
                plan_id,
                expiration_date: req.end_date,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))?;

    let response = assemble_responses(&state, Some(id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Subscription not found")))?;

    Ok(Json(response))
}

/// Delete a subscription; its lines cascade. Existing invoices are not
/// checked and keep a nulled subscription reference.
pub async fn delete_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageBilling)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Subscription ID is required")))?;

    if !state.db.delete_subscription(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Subscription not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
