mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::TestApp;

async fn member(app: &TestApp, token: &str, kind: &str, user_id: i64) -> i64 {
    let (status, body) = app
        .post(&format!("/api/{kind}"), token, json!({"user_id": user_id}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn caregivers_link_and_unlink_patients() {
    let app = TestApp::new().await;
    let (nia, token) = app.sign_up("nia@example.com").await;
    let (oli, _) = app.sign_up("oli@example.com").await;
    let caregiver = member(&app, &token, "caregivers", nia).await;
    let patient = member(&app, &token, "patients", oli).await;
    let links = format!("/api/caregivers/{caregiver}/patients");

    let (status, link) = app.post(&links, &token, json!({"patient_id": patient})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(link["caregiver_id"], caregiver);
    assert_eq!(link["patient_id"], patient);

    let (status, body) = app.post(&links, &token, json!({"patient_id": patient})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    let (status, _) = app.post(&links, &token, json!({"patient_id": 999})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post("/api/caregivers/999/patients", &token, json!({"patient_id": patient}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post(&links, &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get(&format!("/api/caregivers/{caregiver}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "nia@example.com");
    assert_eq!(body["patients"][0]["user"]["email"], "oli@example.com");

    let (status, body) = app
        .get(&format!("/api/patients/{patient}/caregivers"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], caregiver);

    let unlink = format!("/api/caregivers/{caregiver}/patients/{patient}");
    let (status, _) = app.delete(&unlink, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&unlink, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/api/caregivers", &token).await;
    assert_eq!(body[0]["patients"], json!([]));
}

#[tokio::test]
async fn caregiver_creation_validates_the_user_id() {
    let app = TestApp::new().await;
    let (pam, token) = app.sign_up("pam@example.com").await;

    let (status, _) = app.post("/api/caregivers", &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post("/api/caregivers", &token, json!({"user_id": "seven"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post("/api/caregivers", &token, json!({"user_id": 999})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let caregiver = member(&app, &token, "caregivers", pam).await;
    let (status, _) = app.post("/api/caregivers", &token, json!({"user_id": pam})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.delete(&format!("/api/caregivers/{caregiver}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/caregivers/{caregiver}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patients_carry_caregivers_and_records() {
    let app = TestApp::new().await;
    let (quin, token) = app.sign_up("quin@example.com").await;
    let (rae, _) = app.sign_up("rae@example.com").await;
    let patient = member(&app, &token, "patients", quin).await;
    member(&app, &token, "patients", rae).await;

    for condition in ["asthma", "hypertension"] {
        let (status, _) = app
            .post(
                "/api/medical",
                &token,
                json!({"patient_id": patient, "medical_condition": condition, "notes": "stable"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get(&format!("/api/patients?user_id={quin}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let patients = body.as_array().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0]["user"]["email"], "quin@example.com");
    assert_eq!(patients[0]["caregivers"], json!([]));
    assert_eq!(patients[0]["medical_records"][0]["medical_condition"], "hypertension");

    let (_, all) = app.get("/api/patients", &token).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, records) = app
        .get(&format!("/api/patients/{patient}/medical-records"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let conditions: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["medical_condition"].as_str())
        .collect();
    assert_eq!(conditions, ["hypertension", "asthma"]);

    let (status, _) = app.get("/api/patients/999", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/patients/999/caregivers", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/patients/{patient}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, records) = app.get("/api/medical", &token).await;
    assert_eq!(records, Value::Array(vec![]));
    let (status, _) = app.delete(&format!("/api/patients/{patient}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn medical_records_are_managed() {
    let app = TestApp::new().await;
    let (sal, token) = app.sign_up("sal@example.com").await;
    let patient = member(&app, &token, "patients", sal).await;

    let (status, body) = app
        .post("/api/medical", &token, json!({"medical_condition": "flu"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "patient_id is required");

    let (status, record) = app
        .post("/api/medical", &token, json!({"patient_id": patient, "notes": "  rest  "}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["notes"], "rest");
    assert!(record["medical_condition"].is_null());
    let id = record["id"].as_i64().unwrap();

    let (status, updated) = app
        .put(&format!("/api/medical/{id}"), &token, json!({"medical_condition": "flu"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["medical_condition"], "flu");
    assert_eq!(updated["notes"], "rest");

    let (_, listed) = app
        .get(&format!("/api/medical/patient/{patient}"), &token)
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app.put("/api/medical/999", &token, json!({"notes": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/medical/{id}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/api/medical/{id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
