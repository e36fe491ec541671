//! Health and metrics endpoint tests.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_reports_ok() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "erp-service");

    app.cleanup().await;
}

#[tokio::test]
async fn readiness_check_reports_ok() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_is_scrapable() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn api_routes_require_a_token() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .get(format!("{}/api/products", app.address))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 401);

    app.cleanup().await;
}
