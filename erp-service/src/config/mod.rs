use anyhow::Result;
use dotenvy::dotenv;
use erp_core::config as core_config;
use secrecy::Secret;
use std::env;

/// Application configuration, assembled from environment variables at
/// process start. `.env` is honored in development.
#[derive(Clone, Debug)]
pub struct ErpConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub app_url: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub smtp: Option<SmtpConfig>,
    /// Password assigned to accounts created by an operator (customers and
    /// users without an explicit password). Holders are expected to reset it.
    pub default_account_password: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub expiry_days: i64,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: Secret<String>,
    pub from_email: String,
}

impl ErpConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let port = env::var("ERP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let max_connections = env::var("ERP_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("ERP_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "change-me-in-production".to_string());
        let jwt_expiry_days = env::var("JWT_EXPIRY_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()?;

        // SMTP is optional: without it, password-reset links are only logged.
        let smtp = match (env::var("SMTP_HOST"), env::var("SMTP_USER")) {
            (Ok(host), Ok(user)) => Some(SmtpConfig {
                host,
                from_email: env::var("SMTP_FROM").unwrap_or_else(|_| user.clone()),
                password: Secret::new(env::var("SMTP_PASSWORD").unwrap_or_default()),
                user,
            }),
            _ => None,
        };

        Ok(Self {
            common: core_config::Config { port },
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "erp-service".to_string()),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            database: DatabaseConfig {
                url: Secret::new(database_url),
                max_connections,
                min_connections,
            },
            jwt: JwtConfig {
                secret: Secret::new(jwt_secret),
                expiry_days: jwt_expiry_days,
            },
            smtp,
            default_account_password: Secret::new(
                env::var("DEFAULT_ACCOUNT_PASSWORD").unwrap_or_else(|_| "Customer@123".to_string()),
            ),
        })
    }
}
