//! Tax endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    dtos::{
        catalog::{CreateTaxRequest, UpdateTaxRequest},
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{CreateTax, Tax, UpdateTax},
    services::policy::{self, Capability},
    startup::AppState,
};
use erp_core::error::AppError;

/// List all taxes.
pub async fn list_taxes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Tax>>, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    let taxes = state.db.list_taxes().await?;
    Ok(Json(taxes))
}

/// Create a tax rule.
pub async fn create_tax(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateTaxRequest>,
) -> Result<(StatusCode, Json<Tax>), AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let (Some(name), Some(tax_type), Some(rate)) = (req.name, req.tax_type, req.rate) else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Name, type, and rate are required"
        )));
    };

    let tax = state
        .db
        .create_tax(&CreateTax {
            name,
            tax_type,
            rate,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(tax)))
}

/// Update a tax rule.
pub async fn update_tax(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateTaxRequest>,
) -> Result<Json<Tax>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Tax ID is required")))?;

    let tax = state
        .db
        .update_tax(
            id,
            &UpdateTax {
                name: req.name,
                tax_type: req.tax_type,
                rate: req.rate,
                is_active: req.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tax not found")))?;

    Ok(Json(tax))
}

/// Delete a tax rule.
pub async fn delete_tax(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Tax ID is required")))?;

    if !state.db.delete_tax(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Tax not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
