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
use crate::models::{CreateMedicalRecordRequest, MedicalRecord, UpdateMedicalRecordRequest};
use crate::ports::repo::{MedicalRecordUpdate, NewMedicalRecord};
use crate::validate::{required_id, trimmed};

pub async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MedicalRecord>>, ServerError> {
    auth_user(&state, &headers)?;
    let records = state
        .repo
        .list_medical_records(None)
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(records))
}

pub async fn list_patient_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(patient_id): ApiPath<i64>,
) -> Result<Json<Vec<MedicalRecord>>, ServerError> {
    auth_user(&state, &headers)?;
    let records = state
        .repo
        .list_medical_records(Some(patient_id))
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(records))
}

pub async fn create_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateMedicalRecordRequest>,
) -> Result<(StatusCode, Json<MedicalRecord>), ServerError> {
    auth_user(&state, &headers)?;
    let patient_id = required_id(payload.patient_id, "patient_id")?;
    let record = state
        .repo
        .create_medical_record(&NewMedicalRecord {
            patient_id,
            medical_condition: trimmed(payload.medical_condition),
            notes: trimmed(payload.notes),
        })
        .await
        .map_err(|e| map_db_error(e, "medical record already exists"))?;
    info!(record_id = record.id, patient_id, "medical record created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(record_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateMedicalRecordRequest>,
) -> Result<Json<MedicalRecord>, ServerError> {
    auth_user(&state, &headers)?;
    let update = MedicalRecordUpdate {
        medical_condition: trimmed(payload.medical_condition),
        notes: trimmed(payload.notes),
    };
    let record = state
        .repo
        .update_medical_record(record_id, &update)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("medical record"))?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(record_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    auth_user(&state, &headers)?;
    let deleted = state
        .repo
        .delete_medical_record(record_id)
        .await
        .map_err(ServerError::internal)?;
    if !deleted {
        return Err(not_found("medical record"));
    }
    Ok(StatusCode::NO_CONTENT)
}
