use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde_json::Value;
use tracing::info;

use super::{forbidden, not_found, upstream_error};
use crate::app_state::AppState;
use crate::auth::{auth_user, device_or_user};
use crate::errors::{ServerError, map_db_error};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{Device, GpsLocation, LocationRequest, RouteQuery};
use crate::ports::repo::{NewLocation, Repo};
use crate::validate::{bad_request, trimmed, validate_coordinates};

async fn existing_device(repo: &dyn Repo, device_id: i64) -> Result<Device, ServerError> {
    repo.get_device(device_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("device"))
}

pub async fn list_locations(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(device_id): ApiPath<i64>,
) -> Result<Json<Vec<GpsLocation>>, ServerError> {
    auth_user(&state, &headers)?;
    let trace = state
        .repo
        .list_locations(device_id)
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(trace))
}

pub async fn add_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(device_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<LocationRequest>,
) -> Result<(StatusCode, Json<GpsLocation>), ServerError> {
    device_or_user(&state, &headers)?;
    let (Some(latitude), Some(longitude)) = (payload.latitude, payload.longitude) else {
        return Err(bad_request("latitude and longitude are required"));
    };
    validate_coordinates(latitude, longitude)?;
    existing_device(state.repo.as_ref(), device_id).await?;

    let fix = state
        .repo
        .add_location(
            device_id,
            &NewLocation {
                latitude,
                longitude,
                accuracy: payload.accuracy,
            },
        )
        .await
        .map_err(|e| map_db_error(e, "location already recorded"))?;
    info!(device_id, location_id = fix.id, "location recorded");
    Ok((StatusCode::CREATED, Json(fix)))
}

pub async fn latest_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(device_id): ApiPath<i64>,
) -> Result<Json<GpsLocation>, ServerError> {
    let caller = auth_user(&state, &headers)?;
    // Unknown and foreign devices look the same to the caller.
    let owned = state
        .repo
        .get_device(device_id)
        .await
        .map_err(ServerError::internal)?
        .is_some_and(|device| device.user_id == Some(caller.id));
    if !owned {
        return Err(forbidden("access denied to this device"));
    }
    let fix = state
        .repo
        .latest_location(device_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| ServerError::new(StatusCode::NOT_FOUND, "no location found"))?;
    Ok(Json(fix))
}

pub async fn route(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<RouteQuery>,
) -> Result<Json<Value>, ServerError> {
    auth_user(&state, &headers)?;
    let (Some(origin), Some(destination)) = (trimmed(query.origin), trimmed(query.destination))
    else {
        return Err(bad_request("origin and destination are required"));
    };
    let directions = state
        .directions
        .route(&origin, &destination)
        .await
        .map_err(|e| upstream_error(e, "directions service"))?;
    Ok(Json(directions))
}
