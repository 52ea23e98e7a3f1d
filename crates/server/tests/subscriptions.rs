mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use common::{CHECKOUT_URL, Options, TestApp, Upstream};

fn completed(user_id: Value, plan: &str) -> Value {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_1", "metadata": {"user_id": user_id, "plan": plan}}}
    })
}

#[tokio::test]
async fn checkout_sessions_use_configured_plans() {
    let app = TestApp::new().await;
    let (yan, token) = app.sign_up("yan@example.com").await;
    let uri = "/api/subscriptions/create-checkout-session";

    let (status, body) = app
        .post(uri, &token, json!({"user_id": yan, "plan": "gold"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "invalid plan selected");

    let (status, body) = app
        .post(uri, &token, json!({"user_id": yan, "plan": "premium_3m"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], CHECKOUT_URL);

    let requests = app.payments.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.price_id, "price_premium_3m");
    assert_eq!(request.customer_email, "yan@example.com");
    assert_eq!(request.user_id, yan);
    assert_eq!(
        request.success_url,
        "http://app.test/subscription-success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(request.cancel_url, "http://app.test/subscription-cancelled");
}

#[tokio::test]
async fn processor_failures_map_to_gateway_errors() {
    let uri = "/api/subscriptions/create-checkout-session";
    for (mode, expected) in [
        (Upstream::Failing, StatusCode::BAD_GATEWAY),
        (Upstream::Unconfigured, StatusCode::SERVICE_UNAVAILABLE),
    ] {
        let app = TestApp::with(Options {
            payments: mode,
            ..Default::default()
        })
        .await;
        let (_, token) = app.sign_up("zed@example.com").await;
        let (status, _) = app.post(uri, &token, json!({"plan": "premium_1m"})).await;
        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn subscriptions_crud() {
    let app = TestApp::new().await;
    let (abe, token) = app.sign_up("abe@example.com").await;

    let (status, _) = app
        .post("/api/subscriptions", &token, json!({"user_id": abe, "plan": "premium_1m"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post(
            "/api/subscriptions",
            &token,
            json!({"user_id": abe, "plan": "premium_1m", "status": "active", "renewal_date": "soon"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = app
        .post(
            "/api/subscriptions",
            &token,
            json!({"user_id": abe, "plan": "premium_1m", "status": "active", "renewal_date": "2030-01-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["user_email"], "abe@example.com");
    let id = created["id"].as_i64().unwrap();

    let (status, latest) = app
        .get(&format!("/api/subscriptions/user/{abe}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["id"], id);

    let (status, updated) = app
        .put(&format!("/api/subscriptions/{id}"), &token, json!({"status": "cancelled"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "cancelled");
    assert_eq!(updated["plan"], "premium_1m");

    let (_, all) = app.get("/api/subscriptions", &token).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = app.delete(&format!("/api/subscriptions/{id}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("/api/subscriptions/user/{abe}"), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put("/api/subscriptions/999", &token, json!({"plan": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completed_checkouts_activate_subscriptions() {
    let app = TestApp::new().await;
    let (bea, token) = app.sign_up("bea@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/webhook",
            None,
            Some(completed(json!(bea.to_string()), "premium_12m")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"received": true}));

    let (_, first) = app
        .get(&format!("/api/subscriptions/user/{bea}"), &token)
        .await;
    assert_eq!(first["status"], "active");
    assert_eq!(first["plan"], "premium_12m");
    let renewal: DateTime<Utc> = first["renewal_date"].as_str().unwrap().parse().unwrap();
    let days = (renewal - Utc::now()).num_days();
    assert!((360..=366).contains(&days), "{days}");

    let (status, _) = app
        .send(Method::POST, "/api/webhook", None, Some(completed(json!(bea), "premium_1m")))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, all) = app.get("/api/subscriptions", &token).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], first["id"]);
    assert_eq!(all[0]["plan"], "premium_1m");
}

#[tokio::test]
async fn webhook_ignores_other_events_and_rejects_garbage() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/webhook",
            None,
            Some(json!({"type": "invoice.paid", "data": {"object": {}}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/webhook",
            None,
            Some(json!({"type": "checkout.session.completed", "data": {"object": {}}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_secret_is_enforced_when_configured() {
    let app = TestApp::with(Options {
        webhook_secret: Some("whsec_test".into()),
        ..Default::default()
    })
    .await;
    let event = json!({"type": "invoice.paid"});

    let (status, _) = app
        .send(Method::POST, "/api/webhook", None, Some(event.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/webhook")
        .header("x-webhook-secret", "whsec_test")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::OK);
}
