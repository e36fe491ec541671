//! JWT service for token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use erp_core::error::AppError;

/// Bearer-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Role string (ADMIN / INTERNAL_USER / CUSTOMER)
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Issues and validates HS256 tokens signed with the configured secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_days: config.expiry_days,
        }
    }

    /// Generate a token for a user.
    pub fn generate_token(
        &self,
        user_id: &str,
        email: &str,
        role: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp: (now + Duration::days(self.expiry_days)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: Secret::new("test-secret".to_string()),
            expiry_days: 7,
        })
    }

    #[test]
    fn token_round_trips_claims() {
        let jwt = service();
        let token = jwt
            .generate_token("user-1", "admin@erp.com", "ADMIN")
            .unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "admin@erp.com");
        assert_eq!(claims.role, "ADMIN");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let jwt = service();
        let other = JwtService::new(&JwtConfig {
            secret: Secret::new("other-secret".to_string()),
            expiry_days: 7,
        });

        let token = other.generate_token("user-1", "a@b.com", "CUSTOMER").unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service();
        let now = Utc::now();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "a@b.com".to_string(),
            role: "CUSTOMER".to_string(),
            exp: (now - Duration::days(1)).timestamp(),
            iat: (now - Duration::days(8)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(service().validate_token("not-a-token").is_err());
    }
}
