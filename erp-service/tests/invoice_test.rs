//! Invoice tests: server-computed totals and lifecycle.

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

/// Seed customer + product + subscription with one 2 x 50 line; returns the
/// subscription id.
async fn seed_subscription(app: &TestApp, token: &str, email: &str) -> String {
    let response = app
        .post(
            "/api/customers",
            token,
            json!({ "email": email, "firstName": "Bill", "lastName": "Able" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let customer_id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .post(
            "/api/products",
            token,
            json!({ "name": "Service hours", "salesPrice": "50", "costPrice": "20" }),
        )
        .await;
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let product_id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .post(
            "/api/subscriptions",
            token,
            json!({
                "customerId": customer_id,
                "lines": [{ "productId": product_id, "quantity": 2, "unitPrice": "50" }],
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    body["id"].as_str().expect("Missing id").to_string()
}

#[tokio::test]
async fn create_computes_totals_from_lines_and_active_taxes() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let subscription_id = seed_subscription(&app, &token, "tax@erp.test").await;

    let response = app
        .post(
            "/api/taxes",
            &token,
            json!({ "name": "VAT", "type": "PERCENTAGE", "rate": "10" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    // Caller-supplied totals are ignored.
    let response = app
        .post(
            "/api/invoices",
            &token,
            json!({
                "subscriptionId": subscription_id,
                "invoiceNumber": "INV-1001",
                "subtotal": "999",
                "taxAmount": "999",
                "totalAmount": "999",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(money(&body["subtotal"]), 100.0);
    assert_eq!(money(&body["taxAmount"]), 10.0);
    assert_eq!(money(&body["totalAmount"]), 110.0);
    assert_eq!(body["status"], "DRAFT");

    app.cleanup().await;
}

#[tokio::test]
async fn create_requires_subscription_and_number() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post("/api/invoices", &token, json!({ "invoiceNumber": "INV-1" }))
        .await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["error"], "Subscription and invoice number are required");

    app.cleanup().await;
}

#[tokio::test]
async fn create_for_unknown_subscription_is_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post(
            "/api/invoices",
            &token,
            json!({
                "subscriptionId": "99999999-9999-9999-9999-999999999999",
                "invoiceNumber": "INV-404",
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_invoice_number_conflicts() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let subscription_id = seed_subscription(&app, &token, "dupinv@erp.test").await;

    let payload = json!({ "subscriptionId": subscription_id, "invoiceNumber": "INV-DUP" });

    let first = app.post("/api/invoices", &token, payload.clone()).await;
    assert_eq!(first.status(), 201);

    let second = app.post("/api/invoices", &token, payload).await;
    assert_eq!(second.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn single_invoice_read_includes_payments_and_lines() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let subscription_id = seed_subscription(&app, &token, "detail@erp.test").await;

    let response = app
        .post(
            "/api/invoices",
            &token,
            json!({ "subscriptionId": subscription_id, "invoiceNumber": "INV-DETAIL" }),
        )
        .await;
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let id = body["id"].as_str().expect("Missing id").to_string();

    let response = app.get(&format!("/api/invoices?id={}", id), &token).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["invoiceNumber"], "INV-DETAIL");
    assert_eq!(body["lines"].as_array().map(|l| l.len()), Some(1));
    assert_eq!(body["payments"].as_array().map(|p| p.len()), Some(0));
    assert_eq!(body["customer"]["user"]["firstName"], "Bill");

    let response = app
        .get(
            "/api/invoices?id=99999999-9999-9999-9999-999999999999",
            &token,
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn update_overwrites_status_and_due_date() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let subscription_id = seed_subscription(&app, &token, "upd@erp.test").await;

    let response = app
        .post(
            "/api/invoices",
            &token,
            json!({ "subscriptionId": subscription_id, "invoiceNumber": "INV-UPD" }),
        )
        .await;
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .put(
            "/api/invoices",
            &token,
            json!({ "id": id, "status": "SENT", "dueDate": "2027-01-31" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["status"], "SENT");
    assert_eq!(body["dueDate"], "2027-01-31");

    app.cleanup().await;
}

#[tokio::test]
async fn delete_invoice_cascades_payments() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;
    let subscription_id = seed_subscription(&app, &token, "delinv@erp.test").await;

    let response = app
        .post(
            "/api/invoices",
            &token,
            json!({ "subscriptionId": subscription_id, "invoiceNumber": "INV-DEL" }),
        )
        .await;
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .post(
            "/api/payments",
            &token,
            json!({ "invoiceId": id, "amount": "10" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .delete(&format!("/api/invoices?id={}", id), &token)
        .await;
    assert_eq!(response.status(), 200);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
        .fetch_one(app.db.pool())
        .await
        .expect("Failed to count payments");
    assert_eq!(remaining, 0);

    app.cleanup().await;
}
