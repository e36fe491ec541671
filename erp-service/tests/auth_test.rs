//! Login and signup tests.

mod common;

use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn login_returns_token_and_user_without_password() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    assert!(!token.is_empty());

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "ADMIN");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("resetToken").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    app.admin_token().await;

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": "nobody@erp.test", "password": "whatever" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn deactivated_account_cannot_login_even_with_correct_credentials() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    // Sign up a user, then deactivate it through the users endpoint.
    let response = app
        .client
        .post(format!("{}/api/auth/signup", app.address))
        .json(&json!({
            "email": "inactive@erp.test",
            "password": "Passw0rd!x",
            "firstName": "In",
            "lastName": "Active",
        }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let user_id = body["user"]["id"].as_str().expect("Missing user id");

    let response = app
        .put(
            "/api/users",
            &token,
            json!({ "id": user_id, "isActive": false }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": "inactive@erp.test", "password": "Passw0rd!x" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn signup_creates_customer_role_account_and_logs_in() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .post(format!("{}/api/auth/signup", app.address))
        .json(&json!({
            "email": "new.user@erp.test",
            "password": "Passw0rd!x",
            "firstName": "New",
            "lastName": "User",
        }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "CUSTOMER");
    assert!(body["token"].as_str().is_some());

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let payload = json!({
        "email": "dup@erp.test",
        "password": "Passw0rd!x",
        "firstName": "Du",
        "lastName": "Plicate",
    });

    let first = app
        .client
        .post(format!("{}/api/auth/signup", app.address))
        .json(&payload)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(first.status(), 201);

    let second = app
        .client
        .post(format!("{}/api/auth/signup", app.address))
        .json(&payload)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(second.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn customer_role_cannot_write_catalog() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .post(format!("{}/api/auth/signup", app.address))
        .json(&json!({
            "email": "viewer@erp.test",
            "password": "Passw0rd!x",
            "firstName": "Read",
            "lastName": "Only",
        }))
        .send()
        .await
        .expect("Request failed");
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let customer_token = body["token"].as_str().expect("Missing token").to_string();

    let response = app
        .post(
            "/api/products",
            &customer_token,
            json!({ "name": "X", "salesPrice": "10", "costPrice": "4" }),
        )
        .await;
    assert_eq!(response.status(), 403);

    // Reads stay available.
    let response = app.get("/api/products", &customer_token).await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}
