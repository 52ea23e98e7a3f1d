use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::info;

use super::not_found;
use crate::app_state::AppState;
use crate::auth::{auth_user, require_device};
use crate::errors::{ServerError, map_db_error};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Device, RegisterDeviceRequest, RenameDeviceRequest, RenameDeviceResponse};
use crate::ports::repo::DeviceRegistration;
use crate::validate::{bad_request, trimmed};

/// Devices announce themselves on boot; a known MAC refreshes the row.
pub async fn register_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ServerError> {
    require_device(&state, &headers)?;
    let mac = payload.mac.trim();
    if mac.is_empty() {
        return Err(bad_request("mac is required"));
    }

    let device = state
        .repo
        .register_device(&DeviceRegistration {
            mac: mac.to_string(),
            name: trimmed(payload.name),
            user_id: payload.user_id,
        })
        .await
        .map_err(|e| map_db_error(e, "device already registered"))?;

    info!(device_id = device.id, mac = %device.mac, "device registered");
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn get_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(mac): ApiPath<String>,
) -> Result<Json<Device>, ServerError> {
    auth_user(&state, &headers)?;
    let device = state
        .repo
        .get_device_by_mac(mac.trim())
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("device"))?;
    Ok(Json(device))
}

pub async fn rename_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(mac): ApiPath<String>,
    ApiJson(payload): ApiJson<RenameDeviceRequest>,
) -> Result<Json<RenameDeviceResponse>, ServerError> {
    auth_user(&state, &headers)?;
    let name = trimmed(payload.name).ok_or_else(|| bad_request("invalid name"))?;
    let device = state
        .repo
        .rename_device(mac.trim(), &name)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("device"))?;

    info!(device_id = device.id, "device renamed");
    Ok(Json(RenameDeviceResponse {
        success: true,
        device,
    }))
}
