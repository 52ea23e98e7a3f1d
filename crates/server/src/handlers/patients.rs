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
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{MedicalRecord, MemberSummary, PatientDetail, PatientListQuery, UserIdRequest};
use crate::ports::repo::Repo;
use crate::validate::required_id;

async fn patient_detail(
    repo: &dyn Repo,
    patient: MemberSummary,
) -> Result<PatientDetail, ServerError> {
    let caregivers = repo
        .caregivers_of_patient(patient.id)
        .await
        .map_err(ServerError::internal)?;
    let medical_records = repo
        .list_medical_records(Some(patient.id))
        .await
        .map_err(ServerError::internal)?;
    Ok(PatientDetail {
        patient,
        caregivers,
        medical_records,
    })
}

async fn existing_patient(repo: &dyn Repo, patient_id: i64) -> Result<MemberSummary, ServerError> {
    repo.get_patient(patient_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("patient"))
}

pub async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<PatientListQuery>,
) -> Result<Json<Vec<PatientDetail>>, ServerError> {
    auth_user(&state, &headers)?;
    let patients = state
        .repo
        .list_patients(query.user_id)
        .await
        .map_err(ServerError::internal)?;
    let mut out = Vec::with_capacity(patients.len());
    for patient in patients {
        out.push(patient_detail(state.repo.as_ref(), patient).await?);
    }
    Ok(Json(out))
}

pub async fn get_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<PatientDetail>, ServerError> {
    auth_user(&state, &headers)?;
    let patient = existing_patient(state.repo.as_ref(), patient_id).await?;
    Ok(Json(patient_detail(state.repo.as_ref(), patient).await?))
}

pub async fn create_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<UserIdRequest>,
) -> Result<(StatusCode, Json<MemberSummary>), ServerError> {
    auth_user(&state, &headers)?;
    let user_id = required_id(payload.user_id, "user_id")?;
    let patient = state
        .repo
        .create_patient(user_id)
        .await
        .map_err(|e| map_db_error(e, "user is already a patient"))?;
    info!(patient_id = patient.id, user_id, "patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn list_patient_caregivers(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<Vec<MemberSummary>>, ServerError> {
    auth_user(&state, &headers)?;
    existing_patient(state.repo.as_ref(), patient_id).await?;
    let caregivers = state
        .repo
        .caregivers_of_patient(patient_id)
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(caregivers))
}

pub async fn list_patient_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<Vec<MedicalRecord>>, ServerError> {
    auth_user(&state, &headers)?;
    existing_patient(state.repo.as_ref(), patient_id).await?;
    let records = state
        .repo
        .list_medical_records(Some(patient_id))
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(records))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    auth_user(&state, &headers)?;
    let deleted = state
        .repo
        .delete_patient(patient_id)
        .await
        .map_err(ServerError::internal)?;
    if !deleted {
        return Err(not_found("patient"));
    }
    info!(patient_id, "patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
