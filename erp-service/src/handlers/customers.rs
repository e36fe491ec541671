//! Customer endpoints. Each customer owns one user account; both are
//! written in a single transaction and deleted together.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    dtos::{
        customer::{CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest},
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{CreateCustomer, CreateUser, CustomerSubscriptionSummary, CustomerWithUser,
        UpdateCustomer, UserRole},
    services::policy::{self, Capability},
    startup::AppState,
    utils::{hash_password, Password},
};
use erp_core::error::AppError;

/// List all customers with user data and per-subscription totals.
pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    policy::require(&user.0.role, Capability::ViewRecords)?;

    let customers = state.db.list_customers_with_users().await?;
    let summaries = state.db.subscription_summaries_by_customer().await?;

    let mut by_customer: HashMap<Uuid, Vec<CustomerSubscriptionSummary>> = HashMap::new();
    for summary in summaries {
        by_customer
            .entry(summary.customer_id)
            .or_default()
            .push(summary);
    }

    let responses = customers
        .into_iter()
        .map(|row| {
            let subscriptions = by_customer.remove(&row.customer_id).unwrap_or_default();
            CustomerResponse::from_parts(row, subscriptions)
        })
        .collect();

    Ok(Json(responses))
}

/// Create a customer and its user account in one transaction. The account
/// starts with the configured default password.
pub async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    policy::require(&user.0.role, Capability::ManageCustomers)?;

    let (Some(email), Some(first_name), Some(last_name)) =
        (req.email, req.first_name, req.last_name)
    else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Email, first name, and last name are required"
        )));
    };

    let password_hash = hash_password(&Password::new(
        state.config.default_account_password.expose_secret().clone(),
    ))
    .map_err(AppError::InternalError)?
    .into_string();

    let (customer, created_user) = state
        .db
        .create_customer(
            &CreateUser {
                email,
                password_hash,
                first_name,
                last_name,
                role: UserRole::Customer,
                created_by: user.0.sub.parse::<Uuid>().ok(),
            },
            &CreateCustomer {
                company_name: req.company_name,
                phone: req.phone,
                address: req.address,
                city: req.city,
                state: req.state,
                postal_code: req.postal_code,
                country: req.country,
            },
        )
        .await?;

    let row = CustomerWithUser {
        customer_id: customer.customer_id,
        user_id: created_user.user_id,
        company_name: customer.company_name,
        phone: customer.phone,
        address: customer.address,
        city: customer.city,
        state: customer.state,
        postal_code: customer.postal_code,
        country: customer.country,
        created_utc: customer.created_utc,
        updated_utc: customer.updated_utc,
        email: created_user.email,
        first_name: created_user.first_name,
        last_name: created_user.last_name,
        is_active: created_user.is_active,
    };

    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse::from_parts(row, Vec::new())),
    ))
}

/// Update a customer profile and the linked user's names.
pub async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageCustomers)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Customer ID is required")))?;

    let row = state
        .db
        .update_customer(
            id,
            &UpdateCustomer {
                company_name: req.company_name,
                phone: req.phone,
                address: req.address,
                city: req.city,
                state: req.state,
                postal_code: req.postal_code,
                country: req.country,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    Ok(Json(CustomerResponse::from_parts(row, Vec::new())))
}

/// Delete a customer; the linked user is removed with it.
pub async fn delete_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageCustomers)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Customer ID is required")))?;

    if !state.db.delete_customer(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
