//! Authentication endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::auth::{
        ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, MessageResponse,
        ResetPasswordRequest, SignupRequest,
    },
    startup::AppState,
    utils::ValidatedJson,
};
use erp_core::error::AppError;

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.login(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Create a customer account and log it in.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth.signup(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Issue a password-reset token and send (or log) the reset link.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = state.auth.forgot_password(req).await?;
    Ok((
        StatusCode::OK,
        Json(ForgotPasswordResponse {
            message,
            success: true,
        }),
    ))
}

/// Consume a reset token and set the new password.
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.reset_password(req).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password reset successfully".to_string(),
        }),
    ))
}
