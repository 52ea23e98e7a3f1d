use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::info;

use super::not_found;
use crate::app_state::AppState;
use crate::auth::auth_user;
use crate::errors::{ServerError, map_db_error};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{
    CaregiverDetail, CaregiverPatientLink, LinkPatientRequest, MemberSummary, UserIdRequest,
};
use crate::ports::repo::Repo;
use crate::validate::required_id;

async fn caregiver_detail(
    repo: &dyn Repo,
    caregiver: MemberSummary,
) -> Result<CaregiverDetail, ServerError> {
    let patients = repo
        .patients_of_caregiver(caregiver.id)
        .await
        .map_err(ServerError::internal)?;
    Ok(CaregiverDetail {
        caregiver,
        patients,
    })
}

pub async fn list_caregivers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CaregiverDetail>>, ServerError> {
    auth_user(&state, &headers)?;
    let caregivers = state
        .repo
        .list_caregivers()
        .await
        .map_err(ServerError::internal)?;
    let mut out = Vec::with_capacity(caregivers.len());
    for caregiver in caregivers {
        out.push(caregiver_detail(state.repo.as_ref(), caregiver).await?);
    }
    Ok(Json(out))
}

pub async fn get_caregiver(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(caregiver_id): ApiPath<i64>,
) -> Result<Json<CaregiverDetail>, ServerError> {
    auth_user(&state, &headers)?;
    let caregiver = state
        .repo
        .get_caregiver(caregiver_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("caregiver"))?;
    Ok(Json(caregiver_detail(state.repo.as_ref(), caregiver).await?))
}

pub async fn create_caregiver(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<UserIdRequest>,
) -> Result<(StatusCode, Json<MemberSummary>), ServerError> {
    auth_user(&state, &headers)?;
    let user_id = required_id(payload.user_id, "user_id")?;
    let caregiver = state
        .repo
        .create_caregiver(user_id)
        .await
        .map_err(|e| map_db_error(e, "user is already a caregiver"))?;
    info!(caregiver_id = caregiver.id, user_id, "caregiver created");
    Ok((StatusCode::CREATED, Json(caregiver)))
}

pub async fn link_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(caregiver_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<LinkPatientRequest>,
) -> Result<(StatusCode, Json<CaregiverPatientLink>), ServerError> {
    auth_user(&state, &headers)?;
    let patient_id = required_id(payload.patient_id, "patient_id")?;

    state
        .repo
        .get_caregiver(caregiver_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("caregiver"))?;
    state
        .repo
        .get_patient(patient_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("patient"))?;

    let link = state
        .repo
        .link_patient(caregiver_id, patient_id)
        .await
        .map_err(|e| map_db_error(e, "patient already linked to this caregiver"))?;
    info!(caregiver_id, patient_id, "patient linked");
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn unlink_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath((caregiver_id, patient_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode, ServerError> {
    auth_user(&state, &headers)?;
    let removed = state
        .repo
        .unlink_patient(caregiver_id, patient_id)
        .await
        .map_err(ServerError::internal)?;
    info!(caregiver_id, patient_id, removed, "patient unlinked");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_caregiver(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(caregiver_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    auth_user(&state, &headers)?;
    let deleted = state
        .repo
        .delete_caregiver(caregiver_id)
        .await
        .map_err(ServerError::internal)?;
    if !deleted {
        return Err(not_found("caregiver"));
    }
    Ok(StatusCode::NO_CONTENT)
}
