//! Product endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    dtos::{
        catalog::{CreateProductRequest, UpdateProductRequest},
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{CreateProduct, Product, ProductType, ProductWithStats, UpdateProduct},
    services::policy::{self, Capability},
    startup::AppState,
};
use erp_core::error::AppError;

/// List all products.
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ProductWithStats>>, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    let products = state.db.list_products().await?;
    Ok(Json(products))
}

/// Create a product. Type defaults to SERVICE, active by default.
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let (Some(name), Some(sales_price), Some(cost_price)) =
        (req.name, req.sales_price, req.cost_price)
    else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Name, sales price, and cost price are required"
        )));
    };

    let product = state
        .db
        .create_product(&CreateProduct {
            name,
            product_type: req
                .product_type
                .as_deref()
                .map(ProductType::from_string)
                .unwrap_or(ProductType::Service),
            description: req.description,
            sales_price,
            cost_price,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product.
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Product ID is required")))?;

    let product = state
        .db
        .update_product(
            id,
            &UpdateProduct {
                name: req.name,
                product_type: req.product_type.as_deref().map(ProductType::from_string),
                description: req.description,
                sales_price: req.sales_price,
                cost_price: req.cost_price,
                is_active: req.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(product))
}

/// Delete a product.
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageCatalog)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Product ID is required")))?;

    if !state.db.delete_product(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
