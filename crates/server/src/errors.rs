use std::fmt::Display;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;

const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    code: String,
    message: String,
    rate_limited: bool,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
    #[serde(rename = "isRateLimited", skip_serializing_if = "std::ops::Not::not")]
    is_rate_limited: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl ServerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let code = status_code_to_string(status);
        Self {
            status,
            code,
            message: message.into(),
            rate_limited: false,
        }
    }

    /// Logs the cause and hides it from the client.
    pub fn internal(err: impl Display) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            rate_limited: true,
            ..Self::new(StatusCode::TOO_MANY_REQUESTS, message)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
            is_rate_limited: self.rate_limited,
        };
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

pub fn map_db_error(err: sqlx::Error, message: &str) -> ServerError {
    if is_unique_violation(&err) {
        return ServerError::new(StatusCode::CONFLICT, message);
    }
    if is_foreign_key_violation(&err) {
        return ServerError::new(
            StatusCode::BAD_REQUEST,
            "referenced record does not exist",
        );
    }
    ServerError::internal(err)
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                || db_err.code().as_deref() == Some("2067")
    )
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23503")
                || db_err.code().as_deref() == Some("787")
    )
}

fn status_code_to_string(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::TOO_MANY_REQUESTS => "too_many_requests",
        StatusCode::INTERNAL_SERVER_ERROR => "internal_error",
        StatusCode::BAD_GATEWAY => "bad_gateway",
        StatusCode::SERVICE_UNAVAILABLE => "service_unavailable",
        _ => status.canonical_reason().unwrap_or("error"),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ServerError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause() {
        let (status, body) = body_json(ServerError::internal("password=hunter2")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal_error");
        assert_eq!(body["error"]["message"], "internal server error");
        assert!(body.get("isRateLimited").is_none());
    }

    #[tokio::test]
    async fn rate_limited_errors_carry_flag() {
        let (status, body) = body_json(ServerError::rate_limited("slow down")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "too_many_requests");
        assert_eq!(body["isRateLimited"], true);
    }

    #[test]
    fn row_not_found_is_internal() {
        let err = map_db_error(sqlx::Error::RowNotFound, "ignored");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "internal server error");
    }
}
