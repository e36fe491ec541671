//! User administration endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{
    dtos::{
        user::{CreateUserRequest, UpdateUserRequest},
        DeleteResponse, IdQuery,
    },
    middleware::AuthUser,
    models::{CreateUser, UpdateUser, User, UserRole},
    services::policy::{self, Capability},
    startup::AppState,
    utils::{hash_password, Password},
};
use erp_core::error::AppError;

/// List all users. The password hash never serializes.
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    policy::require(&user.0.role, Capability::ManageUsers)?;

    let users = state.db.list_users().await?;
    Ok(Json(users))
}

/// Create a user. Accounts without an explicit password receive the
/// configured default.
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    policy::require(&user.0.role, Capability::ManageUsers)?;

    let (Some(email), Some(first_name), Some(last_name), Some(role)) =
        (req.email, req.first_name, req.last_name, req.role)
    else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Email, first name, last name, and role are required"
        )));
    };

    let password = req
        .password
        .unwrap_or_else(|| state.config.default_account_password.expose_secret().clone());
    let password_hash = hash_password(&Password::new(password))
        .map_err(AppError::InternalError)?
        .into_string();

    let created = state
        .db
        .create_user(&CreateUser {
            email,
            password_hash,
            first_name,
            last_name,
            role: UserRole::from_string(&role),
            created_by: user.0.sub.parse::<Uuid>().ok(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a user; the password is re-hashed when supplied.
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    policy::require(&user.0.role, Capability::ManageUsers)?;

    let id = req
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("User ID is required")))?;

    let password_hash = match req.password {
        Some(password) => Some(
            hash_password(&Password::new(password))
                .map_err(AppError::InternalError)?
                .into_string(),
        ),
        None => None,
    };

    let updated = state
        .db
        .update_user(
            id,
            &UpdateUser {
                first_name: req.first_name,
                last_name: req.last_name,
                role: req.role.as_deref().map(UserRole::from_string),
                is_active: req.is_active,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(updated))
}

/// Delete a user.
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    policy::require(&user.0.role, Capability::ManageUsers)?;

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("User ID is required")))?;

    if !state.db.delete_user(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }

    Ok(Json(DeleteResponse { success: true }))
}
