//! Discount endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    dtos::{
        catalog::{CreateDiscountRequest, UpdateDiscountRequest},
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{CreateDiscount, Discount, UpdateDiscount},
    services::policy::{self, Capability},
    startup::AppState,
};
use erp_core::error::AppError;

/// List all discounts.
pub async fn list_discounts(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Discount>>, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    let discounts = state.db.list_discounts().await?;
    Ok(Json(discounts))
}

/// Create a discount. The validity window opens today unless given.
pub async fn create_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<Discount>), AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let (Some(name), Some(code), Some(discount_type), Some(value)) =
        (req.name, req.code, req.discount_type, req.value)
    else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Name, code, type, and value are required"
        )));
    };

    let discount = state
        .db
        .create_discount(&CreateDiscount {
            name,
            code,
            discount_type,
            value,
            start_date: req.start_date.unwrap_or_else(|| Utc::now().date_naive()),
            end_date: req.end_date,
            is_active: req.is_active.unwrap_or(true),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(discount)))
}

/// Update a discount.
pub async fn update_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateDiscountRequest>,
) -> Result<Json<Discount>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Discount ID is required")))?;

    let discount = state
        .db
        .update_discount(
            id,
            &UpdateDiscount {
                name: req.name,
                code: req.code,
                discount_type: req.discount_type,
                value: req.value,
                start_date: req.start_date,
                end_date: req.end_date,
                is_active: req.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Discount not found")))?;

    Ok(Json(discount))
}

/// Delete a discount.
pub async fn delete_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Discount ID is required")))?;

    if !state.db.delete_discount(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Discount not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
