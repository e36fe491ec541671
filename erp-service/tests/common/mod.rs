//! Test helper module for erp-service integration tests.
//!
//! Spawns the application on a random port against an isolated PostgreSQL
//! schema. Tests skip gracefully when TEST_DATABASE_URL is not set.

#![allow(dead_code)]

use erp_core::config::Config as CoreConfig;
use erp_service::config::{DatabaseConfig, ErpConfig, JwtConfig};
use erp_service::models::{CreateUser, UserRole};
use erp_service::services::Database;
use erp_service::startup::Application;
use erp_service::utils::{hash_password, Password};
use secrecy::Secret;
use std::sync::atomic::{AtomicU32, Ordering};

pub const ADMIN_EMAIL: &str = "admin@erp.test";
pub const ADMIN_PASSWORD: &str = "Admin@123!";

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_erp_{}_{}", std::process::id(), counter)
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub db: Database,
    base_url: String,
    schema_name: String,
}

impl TestApp {
    /// Spawn a new test application on a random port, or None when no test
    /// database is configured.
    pub async fn spawn() -> Option<Self> {
        let base_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set; skipping integration test");
                return None;
            }
        };

        let schema_name = unique_schema_name();

        // Create schema for test isolation
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");

        pool.close().await;

        // Point the app at the schema via search_path
        let separator = if base_url.contains('?') { "&" } else { "?" };
        let db_url = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let config = ErpConfig {
            common: CoreConfig { port: 0 },
            service_name: "erp-service-test".to_string(),
            service_version: "0.1.0".to_string(),
            log_level: "warn".to_string(),
            app_url: "http://localhost:3000".to_string(),
            database: DatabaseConfig {
                url: Secret::new(db_url.clone()),
                max_connections: 5,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: Secret::new("test-jwt-secret".to_string()),
                expiry_days: 7,
            },
            smtp: None,
            default_account_password: Secret::new("Customer@123".to_string()),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        let port = app.port();

        tokio::spawn(app.run_until_stopped());

        let db = Database::new(&db_url, 2, 1)
            .await
            .expect("Failed to connect test database handle");

        Some(Self {
            address: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            db,
            base_url,
            schema_name,
        })
    }

    /// Seed an admin account and log it in, returning the bearer token.
    pub async fn admin_token(&self) -> String {
        let password_hash = hash_password(&Password::new(ADMIN_PASSWORD.to_string()))
            .expect("Failed to hash password")
            .into_string();

        self.db
            .create_user(&CreateUser {
                email: ADMIN_EMAIL.to_string(),
                password_hash,
                first_name: "Test".to_string(),
                last_name: "Admin".to_string(),
                role: UserRole::Admin,
                created_by: None,
            })
            .await
            .expect("Failed to seed admin user");

        let response = self
            .client
            .post(format!("{}/api/auth/login", self.address))
            .json(&serde_json::json!({
                "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to login seeded admin");
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.expect("Invalid login body");
        body["token"].as_str().expect("Missing token").to_string()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn post(
        &self,
        path: &str,
        token: &str,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn put(
        &self,
        path: &str,
        token: &str,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Request failed")
    }

    /// Drop the test schema.
    pub async fn cleanup(&self) {
        if let Ok(pool) = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.base_url)
            .await
        {
            sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema_name))
                .execute(&pool)
                .await
                .ok();
            pool.close().await;
        }
    }
}
