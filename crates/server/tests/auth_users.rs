mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = app.send(Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openapi"], "3.0.3");
    assert!(body["paths"]["/api/alerts"].is_object());
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "not-an-email", "password": "secret123"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "ann@example.com", "password": "12345"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": " ann@example.com ", "password": "123456"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ann@example.com");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "ann@example.com", "password": "another1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "email already registered");
}

#[tokio::test]
async fn login_issues_bearer_tokens() {
    let app = TestApp::new().await;
    app.sign_up("bo@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "bo@example.com", "password": "secret123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 604800);

    for (email, password) in [("bo@example.com", "wrong-pass"), ("nobody@example.com", "secret123")] {
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "invalid credentials");
    }
}

#[tokio::test]
async fn api_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "missing bearer token");

    let (status, body) = app.get("/api/users", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "invalid token");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_up("cy@example.com").await;

    let (status, body) = app
        .post("/api/users", &token, json!({"email": 42, "password": true}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn users_are_listed_with_their_relations() {
    let app = TestApp::new().await;
    let (id, token) = app.sign_up("dee@example.com").await;
    app.register_device("AA:BB:CC:00:00:01", id).await;
    let (status, _) = app.post("/api/patients", &token, json!({"user_id": id})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/api/users", &token).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    let user = &users[0];
    assert_eq!(user["email"], "dee@example.com");
    assert!(user.get("password_hash").is_none());
    assert_eq!(user["devices"][0]["mac"], "AA:BB:CC:00:00:01");
    assert_eq!(user["patients"].as_array().unwrap().len(), 1);
    assert_eq!(user["caregivers"], json!([]));
    assert_eq!(user["events"], json!([]));

    let (status, body) = app.get(&format!("/api/users/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, _) = app.get("/api/users/999", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/users/abc", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_can_be_created_updated_and_deleted() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_up("eve@example.com").await;

    let (status, body) = app
        .post("/api/users", &token, json!({"email": "  ", "password": "secret123"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "email is required");

    let (status, _) = app
        .post("/api/users", &token, json!({"email": "fay@example.com"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = app
        .post(
            "/api/users",
            &token,
            json!({"email": "fay@example.com", "password": "secret123", "fcm_token": "tok"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["fcm_token"], "tok");
    let fay = created["id"].as_i64().unwrap();

    let (status, updated) = app
        .put(&format!("/api/users/{fay}"), &token, json!({"fcm_token": "tok-2"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["fcm_token"], "tok-2");
    assert_eq!(updated["email"], "fay@example.com");

    let (status, _) = app
        .put(&format!("/api/users/{fay}"), &token, json!({"email": "eve@example.com"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .put(&format!("/api/users/{fay}"), &token, json!({"password": "brand-new"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "fay@example.com", "password": "brand-new"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete(&format!("/api/users/{fay}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    let (status, _) = app.delete(&format!("/api/users/{fay}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put("/api/users/999", &token, json!({"fcm_token": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
