//! Password reset flow tests: token issuance, single use, expiry.

mod common;

use common::{TestApp, ADMIN_EMAIL};
use serde_json::json;

async fn stored_reset_token(app: &TestApp, email: &str) -> Option<String> {
    sqlx::query_scalar::<_, Option<String>>("SELECT reset_token FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(app.db.pool())
        .await
        .expect("Failed to read reset token")
}

#[tokio::test]
async fn forgot_password_stores_a_token_and_reset_consumes_it() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    app.admin_token().await;

    let response = app
        .client
        .post(format!("{}/api/auth/forgot-password", app.address))
        .json(&json!({ "email": ADMIN_EMAIL }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["success"], true);

    let token = stored_reset_token(&app, ADMIN_EMAIL)
        .await
        .expect("No reset token stored");
    assert_eq!(token.len(), 64);

    let response = app
        .client
        .post(format!("{}/api/auth/reset-password", app.address))
        .json(&json!({ "token": token, "password": "NewPassw0rd!" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    // Token is cleared and the new password works.
    assert!(stored_reset_token(&app, ADMIN_EMAIL).await.is_none());

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "NewPassw0rd!" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn reset_token_is_rejected_on_reuse() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    app.admin_token().await;

    app.client
        .post(format!("{}/api/auth/forgot-password", app.address))
        .json(&json!({ "email": ADMIN_EMAIL }))
        .send()
        .await
        .expect("Request failed");

    let token = stored_reset_token(&app, ADMIN_EMAIL)
        .await
        .expect("No reset token stored");

    let first = app
        .client
        .post(format!("{}/api/auth/reset-password", app.address))
        .json(&json!({ "token": token, "password": "NewPassw0rd!" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(first.status(), 200);

    let second = app
        .client
        .post(format!("{}/api/auth/reset-password", app.address))
        .json(&json!({ "token": token, "password": "OtherPassw0rd!" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(second.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    app.admin_token().await;

    app.client
        .post(format!("{}/api/auth/forgot-password", app.address))
        .json(&json!({ "email": ADMIN_EMAIL }))
        .send()
        .await
        .expect("Request failed");

    let token = stored_reset_token(&app, ADMIN_EMAIL)
        .await
        .expect("No reset token stored");

    // Simulate the one-hour window elapsing.
    sqlx::query("UPDATE users SET reset_token_expiry = now() - interval '2 hours' WHERE email = $1")
        .bind(ADMIN_EMAIL)
        .execute(app.db.pool())
        .await
        .expect("Failed to expire token");

    let response = app
        .client
        .post(format!("{}/api/auth/reset-password", app.address))
        .json(&json!({ "token": token, "password": "NewPassw0rd!" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn forgot_password_for_unknown_email_is_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let response = app
        .client
        .post(format!("{}/api/auth/forgot-password", app.address))
        .json(&json!({ "email": "ghost@erp.test" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
