mod common;

use common::{spawn_app, PASSWORD};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success(), "Health check failed");
    assert_eq!(response.text().await.expect("Failed to read body"), "OK");
}

#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;

    assert_eq!(app.register("JohnDoe").await, StatusCode::CREATED);
    assert!(app.login("JohnDoe", PASSWORD).await.is_some());
    assert!(app.login("JohnDoe", "Wrong-password").await.is_none());
    assert!(app.login("Nobody", PASSWORD).await.is_none());
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = spawn_app().await;

    assert_eq!(app.register("JohnDoe").await, StatusCode::CREATED);
    assert_eq!(app.register("JohnDoe").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;

    let cases = [
        json!({ "username": "ab", "password": PASSWORD }),
        json!({ "username": "with space", "password": PASSWORD }),
        json!({ "username": "JohnDoe", "password": "short" }),
        json!({ "username": "JohnDoe", "password": PASSWORD, "email": "not-an-email" }),
    ];

    for payload in cases {
        let response = app
            .client
            .post(app.url("/register"))
            .json(&payload)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
    }
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/cart"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/cart", "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_and_role_separation() {
    let app = spawn_app().await;
    let token = app.user_token("JohnDoe").await;

    let response = app.get("/api/profile", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["username"], "JohnDoe");
    assert_eq!(body["display"], "JohnDoe @ Main st. 1");
    assert!(body.get("password").is_none());

    let response = app.get("/api/admin/registry", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // admins may use user routes
    let admin = app.admin_token().await;
    let response = app.get("/api/profile", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_patch_profile_address() {
    let app = spawn_app().await;
    let token = app.user_token("JohnDoe").await;

    let response = app
        .client
        .patch(app.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "address": "Elm st. 2" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = app
        .get("/api/profile", &token)
        .await
        .json::<Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["address"], "Elm st. 2");
}
