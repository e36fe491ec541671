//! Authentication flows: login, signup, forgot/reset password.

use chrono::{Duration, Utc};
use rand::RngCore;
use std::sync::Arc;

use crate::dtos::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
};
use crate::models::{CreateUser, UserRole};
use crate::services::{Database, EmailProvider, JwtService};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};
use erp_core::error::AppError;

#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    jwt: JwtService,
    email: Arc<dyn EmailProvider>,
    app_url: String,
}

impl AuthService {
    pub fn new(
        db: Arc<Database>,
        jwt: JwtService,
        email: Arc<dyn EmailProvider>,
        app_url: String,
    ) -> Self {
        Self {
            db,
            jwt,
            email,
            app_url,
        }
    }

    /// Authenticate with email and password, returning a bearer token and
    /// the user record (password stripped by serialization).
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self
            .db
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

        if !user.is_active {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Account is deactivated. Please contact administrator."
            )));
        }

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid email or password")))?;

        let token = self
            .jwt
            .generate_token(&user.user_id.to_string(), &user.email, &user.role)?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(AuthResponse {
            success: true,
            token,
            user,
        })
    }

    /// Create a customer-role account and log it in.
    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse, AppError> {
        if self.db.find_user_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A user with this email already exists"
            )));
        }

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(AppError::InternalError)?
            .into_string();

        let user = self
            .db
            .create_user(&CreateUser {
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                role: UserRole::Customer,
                created_by: None,
            })
            .await?;

        let token = self
            .jwt
            .generate_token(&user.user_id.to_string(), &user.email, &user.role)?;

        tracing::info!(user_id = %user.user_id, "User signed up");

        Ok(AuthResponse {
            success: true,
            token,
            user,
        })
    }

    /// Issue a time-limited, single-use reset token. The reset link is
    /// always logged; email delivery is best-effort.
    pub async fn forgot_password(&self, req: ForgotPasswordRequest) -> Result<String, AppError> {
        let user = self.db.find_user_by_email(&req.email).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "No account found with this email address. Please check and try again."
            ))
        })?;

        if !user.is_active {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "This account has been deactivated. Please contact support."
            )));
        }

        let reset_token = generate_reset_token();
        let expiry = Utc::now() + Duration::hours(1);

        self.db
            .set_reset_token(user.user_id, &reset_token, expiry)
            .await?;

        let reset_url = format!("{}/reset-password?token={}", self.app_url, reset_token);
        tracing::info!(
            email = %user.email,
            reset_url = %reset_url,
            expires = %expiry,
            "Password reset requested"
        );

        if let Err(e) = self
            .email
            .send_password_reset_email(&user.email, &reset_token, &self.app_url)
            .await
        {
            // The link is already logged; a failed delivery must not fail
            // the request.
            tracing::warn!(error = %e, "Password reset email not delivered");
        }

        Ok(format!(
            "Password reset instructions have been sent to {}. Please check your inbox.",
            user.email
        ))
    }

    /// Consume a reset token and set the new password.
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError> {
        let user = self
            .db
            .find_user_by_valid_reset_token(&req.token)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Invalid or expired reset token"))
            })?;

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(AppError::InternalError)?
            .into_string();

        self.db
            .complete_password_reset(user.user_id, &password_hash)
            .await?;

        Ok(())
    }
}

/// 32 random bytes, hex-encoded.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_64_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }
}
