//! Recurring plan endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    dtos::{
        catalog::{CreatePlanRequest, UpdatePlanRequest},
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{BillingPeriod, CreatePlan, PlanWithStats, RecurringPlan, UpdatePlan},
    services::policy::{self, Capability},
    startup::AppState,
};
use erp_core::error::AppError;

/// List all plans.
pub async fn list_plans(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<PlanWithStats>>, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    let plans = state.db.list_plans().await?;
    Ok(Json(plans))
}

/// Create a plan. Flags default to closable/pausable/renewable.
pub async fn create_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<RecurringPlan>), AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let (Some(name), Some(billing_period), Some(price)) =
        (req.name, req.billing_period, req.price)
    else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Name, billing period, and price are required"
        )));
    };

    let plan = state
        .db
        .create_plan(&CreatePlan {
            name,
            billing_period: BillingPeriod::from_string(&billing_period),
            price,
            description: req.description,
            auto_close: req.auto_close.unwrap_or(false),
            closable: req.closable.unwrap_or(true),
            pausable: req.pausable.unwrap_or(true),
            renewable: req.renewable.unwrap_or(true),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

/// Update a plan.
pub async fn update_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdatePlanRequest>,
) -> Result<Json<RecurringPlan>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Plan ID is required")))?;

    let plan = state
        .db
        .update_plan(
            id,
            &UpdatePlan {
                name: req.name,
                billing_period: req.billing_period.as_deref().map(BillingPeriod::from_string),
                price: req.price,
                description: req.description,
                auto_close: req.auto_close,
                closable: req.closable,
                pausable: req.pausable,
                renewable: req.renewable,
                is_active: req.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Plan not found")))?;

    Ok(Json(plan))
}

/// Delete a plan.
pub async fn delete_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Plan ID is required")))?;

    if !state.db.delete_plan(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Plan not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
