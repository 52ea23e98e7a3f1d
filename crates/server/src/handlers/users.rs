use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::info;

use super::not_found;
use crate::app_state::AppState;
use crate::auth::{auth_user, hash_password};
use crate::errors::{ServerError, map_db_error};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{CreateUserRequest, UpdateUserRequest, UserDetail, UserRow};
use crate::ports::repo::{NewUser, Repo, UserUpdate};
use crate::validate::{bad_request, is_valid_email, required_text, trimmed};

const EMAIL_TAKEN: &str = "email already registered";

async fn user_detail(repo: &dyn Repo, user: UserRow) -> Result<UserDetail, ServerError> {
    let devices = repo
        .list_devices_for_user(user.id)
        .await
        .map_err(ServerError::internal)?;
    let events = repo
        .list_events_for_user(user.id)
        .await
        .map_err(ServerError::internal)?;
    let caregivers = repo
        .list_caregivers_for_user(user.id)
        .await
        .map_err(ServerError::internal)?;
    let patients = repo
        .list_patients_for_user(user.id)
        .await
        .map_err(ServerError::internal)?;
    Ok(UserDetail {
        user,
        devices,
        events,
        caregivers,
        patients,
    })
}

fn checked_email(raw: &str) -> Result<(), ServerError> {
    if is_valid_email(raw) {
        Ok(())
    } else {
        Err(bad_request("a valid email is required"))
    }
}

fn non_blank_password(raw: Option<String>) -> Option<String> {
    raw.filter(|p| !p.trim().is_empty())
}

pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserDetail>>, ServerError> {
    auth_user(&state, &headers)?;
    let users = state.repo.list_users().await.map_err(ServerError::internal)?;
    let mut out = Vec::with_capacity(users.len());
    for user in users {
        out.push(user_detail(state.repo.as_ref(), user).await?);
    }
    Ok(Json(out))
}

pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<UserDetail>, ServerError> {
    auth_user(&state, &headers)?;
    let user = state
        .repo
        .get_user(user_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("user"))?;
    Ok(Json(user_detail(state.repo.as_ref(), user).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserRow>), ServerError> {
    auth_user(&state, &headers)?;
    let email = required_text(payload.email, "email")?;
    checked_email(&email)?;
    let password = non_blank_password(payload.password)
        .ok_or_else(|| bad_request("password is required"))?;

    let password_hash = hash_password(&password).map_err(ServerError::internal)?;
    let user = state
        .repo
        .create_user(&NewUser {
            email,
            password_hash,
            fcm_token: trimmed(payload.fcm_token),
        })
        .await
        .map_err(|e| map_db_error(e, EMAIL_TAKEN))?;

    info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserRow>, ServerError> {
    auth_user(&state, &headers)?;
    let email = trimmed(payload.email);
    if let Some(email) = email.as_deref() {
        checked_email(email)?;
    }
    let password_hash = non_blank_password(payload.password)
        .map(|p| hash_password(&p))
        .transpose()
        .map_err(ServerError::internal)?;

    let update = UserUpdate {
        email,
        password_hash,
        fcm_token: trimmed(payload.fcm_token),
    };
    let user = state
        .repo
        .update_user(user_id, &update)
        .await
        .map_err(|e| map_db_error(e, EMAIL_TAKEN))?
        .ok_or_else(|| not_found("user"))?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    auth_user(&state, &headers)?;
    let deleted = state
        .repo
        .delete_user(user_id)
        .await
        .map_err(ServerError::internal)?;
    if !deleted {
        return Err(not_found("user"));
    }
    info!(user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
