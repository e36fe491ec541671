//! Subscription lifecycle tests: number generation, totals, update, delete.

mod common;

use common::TestApp;
use serde_json::json;

/// Decimal fields serialize as strings; compare them numerically.
fn money(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::String(s) => s.parse().expect("Invalid decimal string"),
        other => other.as_f64().expect("Invalid decimal value"),
    }
}

/// Seed a customer and return its id.
async fn seed_customer(app: &TestApp, token: &str, email: &str) -> String {
    let response = app
        .post(
            "/api/customers",
            token,
            json!({ "email": email, "firstName": "Sub", "lastName": "Scriber" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    body["id"].as_str().expect("Missing id").to_string()
}

/// Seed a product and return its id.
async fn seed_product(app: &TestApp, token: &str, name: &str, price: &str) -> String {
    let response = app
        .post(
            "/api/products",
            token,
            json!({ "name": name, "salesPrice": price, "costPrice": "1" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    body["id"].as_str().expect("Missing id").to_string()
}

#[tokio::test]
async fn create_without_number_generates_sub_prefixed_number() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let customer_id = seed_customer(&app, &token, "numbers@erp.test").await;

    let response = app
        .post(
            "/api/subscriptions",
            &token,
            json!({ "customerId": customer_id }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let number = body["subscriptionNumber"].as_str().expect("Missing number");
    assert!(number.starts_with("SUB-"));
    assert!(number[4..].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(body["status"], "DRAFT");

    // The "Draft" placeholder is replaced the same way.
    let response = app
        .post(
            "/api/subscriptions",
            &token,
            json!({ "customerId": customer_id, "subscriptionNumber": "Draft" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let second = body["subscriptionNumber"].as_str().expect("Missing number");
    assert!(second.starts_with("SUB-"));
    assert_ne!(number, second);

    app.cleanup().await;
}

#[tokio::test]
async fn create_requires_a_customer() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post("/api/subscriptions", &token, json!({ "status": "DRAFT" }))
        .await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["error"], "Customer is required");

    app.cleanup().await;
}

#[tokio::test]
async fn total_amount_sums_lines() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let customer_id = seed_customer(&app, &token, "lines@erp.test").await;
    let product_a = seed_product(&app, &token, "Widget", "10").await;
    let product_b = seed_product(&app, &token, "Gadget", "5").await;

    let response = app
        .post(
            "/api/subscriptions",
            &token,
            json!({
                "customerId": customer_id,
                "lines": [
                    { "productId": product_a, "quantity": 2, "unitPrice": "10" },
                    { "productId": product_b, "quantity": 1, "unitPrice": "5" },
                ],
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(money(&body["totalAmount"]), 25.0);
    assert_eq!(body["lines"].as_array().map(|l| l.len()), Some(2));
    assert_eq!(body["lines"][0]["product"]["name"], "Widget");

    app.cleanup().await;
}

#[tokio::test]
async fn total_amount_falls_back_to_plan_price() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let customer_id = seed_customer(&app, &token, "planonly@erp.test").await;

    let response = app
        .post(
            "/api/plans",
            &token,
            json!({ "name": "Gold", "billingPeriod": "MONTHLY", "price": "99.99" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let plan_id = body["id"].as_str().expect("Missing id").to_string();

    // The legacy recurringPlanId alias is accepted.
    let response = app
        .post(
            "/api/subscriptions",
            &token,
            json!({ "customerId": customer_id, "recurringPlanId": plan_id }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(money(&body["totalAmount"]), 99.99);
    assert_eq!(body["recurringPlan"]["name"], "Gold");

    app.cleanup().await;
}

#[tokio::test]
async fn expiration_defaults_to_thirty_days_after_start() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let customer_id = seed_customer(&app, &token, "expiry@erp.test").await;

    let response = app
        .post(
            "/api/subscriptions",
            &token,
            json!({ "customerId": customer_id, "startDate": "2026-01-01" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["startDate"], "2026-01-01");
    assert_eq!(body["expirationDate"], "2026-01-31");

    app.cleanup().await;
}

#[tokio::test]
async fn update_changes_status_and_expiration() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let customer_id = seed_customer(&app, &token, "updates@erp.test").await;

    let response = app
        .post(
            "/api/subscriptions",
            &token,
            json!({ "customerId": customer_id }),
        )
        .await;
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .put(
            "/api/subscriptions",
            &token,
            json!({ "id": id, "status": "RUNNING", "endDate": "2027-06-30" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["status"], "RUNNING");
    assert_eq!(body["expirationDate"], "2027-06-30");

    app.cleanup().await;
}

#[tokio::test]
async fn delete_cascades_lines() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let customer_id = seed_customer(&app, &token, "cascades@erp.test").await;
    let product_id = seed_product(&app, &token, "Line item", "3").await;

    let response = app
        .post(
            "/api/subscriptions",
            &token,
            json!({
                "customerId": customer_id,
                "lines": [{ "productId": product_id, "quantity": 4, "unitPrice": "3" }],
            }),
        )
        .await;
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .delete(&format!("/api/subscriptions?id={}", id), &token)
        .await;
    assert_eq!(response.status(), 200);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscription_lines")
        .fetch_one(app.db.pool())
        .await
        .expect("Failed to count lines");
    assert_eq!(remaining, 0);

    app.cleanup().await;
}
