//! Product CRUD tests.

mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_product_defaults_type_and_active_flag() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post(
            "/api/products",
            &token,
            json!({ "name": "X", "salesPrice": "10", "costPrice": "4" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["type"], "SERVICE");
    assert_eq!(body["isActive"], true);
    assert_eq!(body["name"], "X");

    app.cleanup().await;
}

#[tokio::test]
async fn create_product_requires_name_and_prices() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post("/api/products", &token, json!({ "name": "No prices" }))
        .await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["error"], "Name, sales price, and cost price are required");

    app.cleanup().await;
}

#[tokio::test]
async fn update_and_delete_product() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .post(
            "/api/products",
            &token,
            json!({ "name": "Storable", "type": "STORABLE", "salesPrice": "25", "costPrice": "11" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let id = body["id"].as_str().expect("Missing id").to_string();

    let response = app
        .put(
            "/api/products",
            &token,
            json!({ "id": id, "isActive": false, "salesPrice": "30" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["isActive"], false);
    assert_eq!(body["type"], "STORABLE");

    let response = app
        .delete(&format!("/api/products?id={}", id), &token)
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .delete(&format!("/api/products?id={}", id), &token)
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn update_without_id_is_a_bad_request() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.admin_token().await;

    let response = app
        .put("/api/products", &token, json!({ "name": "No id" }))
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}
