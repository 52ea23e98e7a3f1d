use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{info, warn};

use super::not_found;
use crate::app::alerts::fan_out;
use crate::app_state::AppState;
use crate::auth::{Caller, auth_user, device_or_user};
use crate::errors::{ServerError, map_db_error};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{AlertCreatedResponse, AlertView, CreateAlertRequest, UpdateAlertRequest};
use crate::ports::repo::NewAlert;
use crate::validate::{required_id, required_text};

pub async fn list_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AlertView>>, ServerError> {
    auth_user(&state, &headers)?;
    let alerts = state
        .repo
        .list_alerts(None)
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(alerts))
}

pub async fn list_device_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(device_id): ApiPath<i64>,
) -> Result<Json<Vec<AlertView>>, ServerError> {
    auth_user(&state, &headers)?;
    let alerts = state
        .repo
        .list_alerts(Some(device_id))
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(alerts))
}

pub async fn create_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateAlertRequest>,
) -> Result<(StatusCode, Json<AlertCreatedResponse>), ServerError> {
    let caller = device_or_user(&state, &headers)?;
    let message = required_text(payload.message, "message")?;
    let device_id = required_id(payload.device_id, "device_id")?;
    let user_id = required_id(payload.user_id, "user_id")?;

    let alert = state
        .repo
        .create_alert(&NewAlert {
            message,
            lat: payload.lat,
            lng: payload.lng,
            device_id,
            user_id,
        })
        .await
        .map_err(|e| map_db_error(e, "alert already exists"))?;

    info!(
        alert_id = alert.id,
        device_id,
        user_id,
        from_device = matches!(caller, Caller::Device),
        "alert created"
    );

    // The alert is stored; a failed contact lookup only narrows the fan-out.
    let caregivers = match state.repo.linked_caregiver_contacts(user_id).await {
        Ok(contacts) => contacts,
        Err(err) => {
            warn!(alert_id = alert.id, error = %err, "caregiver lookup failed");
            Vec::new()
        }
    };
    let notifications = fan_out(&state.notifier, &alert, &caregivers).await;

    Ok((
        StatusCode::CREATED,
        Json(AlertCreatedResponse {
            message: "Alert created".to_string(),
            alert,
            notifications,
        }),
    ))
}

pub async fn update_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(alert_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateAlertRequest>,
) -> Result<Json<AlertView>, ServerError> {
    auth_user(&state, &headers)?;
    let alert = state
        .repo
        .set_alert_handled(alert_id, payload.handled)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("alert"))?;
    info!(alert_id, handled = alert.handled, "alert updated");
    Ok(Json(alert))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(alert_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    auth_user(&state, &headers)?;
    let deleted = state
        .repo
        .delete_alert(alert_id)
        .await
        .map_err(ServerError::internal)?;
    if !deleted {
        return Err(not_found("alert"));
    }
    Ok(StatusCode::NO_CONTENT)
}
