//! Unauthenticated service endpoints.
use axum::Json;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::models::HealthResponse;

const OPENAPI_JSON: &str = include_str!("../../res/openapi.json");

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn openapi() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/json")], OPENAPI_JSON)
}
