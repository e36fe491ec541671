//! User operations.

use super::{map_db_err, map_insert_err, Database};
use crate::models::{CreateUser, UpdateUser, User};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, Utc};
use erp_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

const USER_COLUMNS: &str = "user_id, email, password_hash, first_name, last_name, role, \
     is_active, reset_token, reset_token_expiry, created_by, created_utc, updated_utc";

impl Database {
    /// Create a new user. Email is stored lowercased.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: &CreateUser) -> Result<User, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (user_id, email, password_hash, first_name, last_name, role, is_active, created_by)
            VALUES ($1, lower($2), $3, $4, $5, $6, TRUE, $7)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.role.as_str())
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "A user with this email"))?;

        timer.observe_duration();

        info!(user_id = %user.user_id, "User created");

        Ok(user)
    }

    /// Look up a user by email (case-insensitive).
    #[instrument(skip(self))]
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_email"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "find user by email"))?;

        timer.observe_duration();

        Ok(user)
    }

    /// Look up a user by id.
    #[instrument(skip(self))]
    pub async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "find user by id"))?;

        Ok(user)
    }

    /// List all users, newest first.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_users"])
            .start_timer();

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_utc DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "list users"))?;

        timer.observe_duration();

        Ok(users)
    }

    /// Update a user. Absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_user(
        &self,
        user_id: Uuid,
        input: &UpdateUser,
    ) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                password_hash = COALESCE($6, password_hash),
                updated_utc = now()
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.role.map(|r| r.as_str()))
        .bind(input.is_active)
        .bind(&input.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "update user"))?;

        timer.observe_duration();

        Ok(user)
    }

    /// Delete a user. Returns false when the id does not exist.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "delete user"))?;

        Ok(result.rows_affected() > 0)
    }

    /// Store a password-reset token and its expiry on the user row.
    #[instrument(skip(self, token))]
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expiry = $3, updated_utc = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(token)
        .bind(expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "store reset token"))?;

        Ok(())
    }

    /// Find the user holding an unexpired reset token.
    #[instrument(skip(self, token))]
    pub async fn find_user_by_valid_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_token = $1 AND reset_token_expiry > now()"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "find user by reset token"))?;

        Ok(user)
    }

    /// Set a new password hash and clear the reset token (single use).
    #[instrument(skip(self, password_hash))]
    pub async fn complete_password_reset(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, reset_token = NULL, \
             reset_token_expiry = NULL, updated_utc = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "complete password reset"))?;

        info!(user_id = %user_id, "Password reset completed");

        Ok(())
    }
}
