//! Customer CRUD tests, including the user cascade.

mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_customer_creates_its_user_account() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post(
            "/api/customers",
            &token,
            json!({
                "email": "john.doe@acme.test",
                "firstName": "John",
                "lastName": "Doe",
                "companyName": "Acme Corp",
                "city": "Springfield",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["companyName"], "Acme Corp");
    assert_eq!(body["user"]["email"], "john.doe@acme.test");
    assert_eq!(body["user"]["firstName"], "John");
    assert_eq!(body["user"]["isActive"], true);

    // The account can log in with the default password.
    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": "john.doe@acme.test", "password": "Customer@123" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn create_customer_requires_email_and_names() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post("/api/customers", &token, json!({ "firstName": "Solo" }))
        .await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["error"], "Email, first name, and last name are required");

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_a_customer_removes_its_user() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post(
            "/api/customers",
            &token,
            json!({
                "email": "cascade@acme.test",
                "firstName": "Cas",
                "lastName": "Cade",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let customer_id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .delete(&format!("/api/customers?id={}", customer_id), &token)
        .await;
    assert_eq!(response.status(), 200);

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'cascade@acme.test'")
            .fetch_one(app.db.pool())
            .await
            .expect("Failed to count users");
    assert_eq!(remaining, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn update_customer_touches_profile_and_user_names() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post(
            "/api/customers",
            &token,
            json!({
                "email": "rename@acme.test",
                "firstName": "Old",
                "lastName": "Name",
            }),
        )
        .await;
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let customer_id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .put(
            "/api/customers",
            &token,
            json!({
                "id": customer_id,
                "companyName": "Renamed Ltd",
                "firstName": "New",
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["companyName"], "Renamed Ltd");
    assert_eq!(body["user"]["firstName"], "New");
    assert_eq!(body["user"]["lastName"], "Name");

    app.cleanup().await;
}
