use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::app_state::AppState;
use crate::auth::{hash_password, verify_password};
use crate::errors::{ServerError, map_db_error};
use crate::extract::ApiJson;
use crate::models::{LoginRequest, RegisterRequest, RegisteredUser, TokenResponse};
use crate::ports::repo::NewUser;
use crate::validate::{MIN_PASSWORD_LEN, bad_request, is_valid_email};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>), ServerError> {
    let email = payload.email.trim();
    if !is_valid_email(email) {
        return Err(bad_request("a valid email is required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_password(&payload.password).map_err(ServerError::internal)?;
    let user = state
        .repo
        .create_user(&NewUser {
            email: email.to_string(),
            password_hash,
            fcm_token: None,
        })
        .await
        .map_err(|e| map_db_error(e, "email already registered"))?;

    info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id,
            email: user.email,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ServerError> {
    let credentials = state
        .repo
        .find_credentials(payload.email.trim())
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| bad_request("invalid credentials"))?;

    verify_password(&credentials.password_hash, &payload.password)
        .map_err(|_| bad_request("invalid credentials"))?;

    let token = state
        .tokens
        .issue(credentials.id, &credentials.email)
        .map_err(ServerError::internal)?;

    info!(user_id = credentials.id, "user logged in");
    Ok(Json(TokenResponse {
        token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.ttl_seconds(),
    }))
}
