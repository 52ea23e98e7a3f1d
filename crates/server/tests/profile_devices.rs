mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use common::{DEVICE_KEY, TestApp};

#[tokio::test]
async fn profiles_are_private_to_their_owner() {
    let app = TestApp::new().await;
    let (gus, gus_token) = app.sign_up("gus@example.com").await;
    let (hal, _) = app.sign_up("hal@example.com").await;

    let (status, body) = app.get(&format!("/api/profile/{gus}"), &gus_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "gus@example.com");
    assert!(body["date_of_birth"].is_null());

    let (status, body) = app.get(&format!("/api/profile/{hal}"), &gus_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");

    let (status, _) = app
        .put(&format!("/api/profile/{hal}"), &gus_token, json!({"first_name": "Hal"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_updates_trim_and_parse_dates() {
    let app = TestApp::new().await;
    let (id, token) = app.sign_up("ida@example.com").await;
    let uri = format!("/api/profile/{id}");

    let (status, body) = app
        .put(
            &uri,
            &token,
            json!({
                "first_name": "  Ida ",
                "blood_type": "O+",
                "date_of_birth": "1948-07-21T00:00:00.000Z"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["first_name"], "Ida");
    assert_eq!(body["blood_type"], "O+");
    assert_eq!(body["date_of_birth"], "1948-07-21");

    let (status, body) = app.put(&uri, &token, json!({"last_name": "Lane"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Ida");
    assert_eq!(body["last_name"], "Lane");
    assert_eq!(body["date_of_birth"], "1948-07-21");

    let (status, body) = app.put(&uri, &token, json!({"date_of_birth": ""})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["date_of_birth"].is_null());
    assert_eq!(body["blood_type"], "O+");

    let (status, body) = app
        .put(&uri, &token, json!({"date_of_birth": "21/07/1948"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("date_of_birth")
    );
}

#[tokio::test]
async fn device_registration_needs_the_device_key() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_up("jo@example.com").await;

    let (status, body) = app
        .post("/api/devices", &token, json!({"mac": "AA:00"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "unauthorized device");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/devices")
        .header("x-device-key", "wrong-key")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"mac": "AA:00"}).to_string()))
        .unwrap();
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post_as_device("/api/devices", json!({"mac": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn legacy_firmware_may_send_the_key_as_bearer() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/devices",
            Some(DEVICE_KEY),
            Some(json!({"mac": "AA:BB:CC:DD:EE:01"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["user_id"].is_null());
}

#[tokio::test]
async fn devices_upsert_by_mac_and_can_be_renamed() {
    let app = TestApp::new().await;
    let (owner, token) = app.sign_up("kim@example.com").await;

    let first = app.register_device("AA:BB:CC:DD:EE:FF", owner).await;
    let (status, again) = app
        .post_as_device("/api/devices", json!({"mac": "AA:BB:CC:DD:EE:FF"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(again["id"], first);
    assert_eq!(again["name"], "wristband");
    assert_eq!(again["user_id"], owner);

    let (status, body) = app.get("/api/devices/AA:BB:CC:DD:EE:FF", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], first);

    let (status, _) = app.get("/api/devices/00:00:00:00:00:00", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .put("/api/devices/AA:BB:CC:DD:EE:FF", &token, json!({"name": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "invalid name");

    let (status, body) = app
        .put("/api/devices/AA:BB:CC:DD:EE:FF", &token, json!({"name": "Grandma's pendant"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["device"]["name"], "Grandma's pendant");

    let (status, _) = app
        .put("/api/devices/00:00:00:00:00:00", &token, json!({"name": "ghost"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn devices_for_unknown_users_are_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_as_device("/api/devices", json!({"mac": "AA:01", "user_id": 4242}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "referenced record does not exist");
}
