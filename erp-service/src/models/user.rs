//! User model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    InternalUser,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::InternalUser => "INTERNAL_USER",
            UserRole::Customer => "CUSTOMER",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "ADMIN" => UserRole::Admin,
            "INTERNAL_USER" => UserRole::InternalUser,
            _ => UserRole::Customer,
        }
    }
}

/// User account. The password hash and reset-token fields never serialize.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_by: Option<Uuid>,
}

/// Input for updating a user. Only supplied fields change.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [UserRole::Admin, UserRole::InternalUser, UserRole::Customer] {
            assert_eq!(UserRole::from_string(role.as_str()), role);
        }
    }

    #[test]
    fn unknown_role_defaults_to_customer() {
        assert_eq!(UserRole::from_string("SUPERUSER"), UserRole::Customer);
    }
}
