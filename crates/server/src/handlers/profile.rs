use axum::{Json, extract::State, http::HeaderMap};
use tracing::info;

use super::{ensure_self, not_found};
use crate::app_state::AppState;
use crate::auth::auth_user;
use crate::errors::ServerError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Profile, ProfileUpdateRequest};
use crate::ports::repo::ProfileUpdate;
use crate::validate::parse_date;

/// Provided strings are stored trimmed; an empty string clears the field.
fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn to_update(payload: ProfileUpdateRequest) -> Result<ProfileUpdate, ServerError> {
    let date_of_birth = match text(payload.date_of_birth) {
        None => None,
        Some(raw) if raw.is_empty() => Some(None),
        Some(raw) => Some(Some(parse_date(&raw, "date_of_birth")?)),
    };
    Ok(ProfileUpdate {
        first_name: text(payload.first_name),
        last_name: text(payload.last_name),
        address: text(payload.address),
        phone: text(payload.phone),
        emergency_name: text(payload.emergency_name),
        emergency_phone: text(payload.emergency_phone),
        medical_info: text(payload.medical_info),
        date_of_birth,
        gender: text(payload.gender),
        blood_type: text(payload.blood_type),
        allergies: text(payload.allergies),
        chronic_conditions: text(payload.chronic_conditions),
        current_medications: text(payload.current_medications),
        past_surgeries: text(payload.past_surgeries),
        primary_physician: text(payload.primary_physician),
        physician_contact: text(payload.physician_contact),
        preferred_pharmacy: text(payload.preferred_pharmacy),
        insurance_provider: text(payload.insurance_provider),
        insurance_policy: text(payload.insurance_policy),
        vaccination_records: text(payload.vaccination_records),
    })
}

pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Profile>, ServerError> {
    let caller = auth_user(&state, &headers)?;
    ensure_self(&caller, user_id)?;
    let profile = state
        .repo
        .get_profile(user_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("user"))?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ProfileUpdateRequest>,
) -> Result<Json<Profile>, ServerError> {
    let caller = auth_user(&state, &headers)?;
    ensure_self(&caller, user_id)?;
    let update = to_update(payload)?;
    let profile = state
        .repo
        .update_profile(user_id, &update)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("user"))?;
    info!(user_id, "profile updated");
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn strings_are_trimmed_and_absent_fields_untouched() {
        let update = to_update(ProfileUpdateRequest {
            first_name: Some("  Ada ".into()),
            phone: Some("   ".into()),
            date_of_birth: Some("1950-02-03T00:00:00Z".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Ada"));
        assert_eq!(update.phone.as_deref(), Some(""));
        assert_eq!(update.last_name, None);
        assert_eq!(
            update.date_of_birth,
            Some(NaiveDate::from_ymd_opt(1950, 2, 3))
        );
    }

    #[test]
    fn blank_birth_date_clears_it() {
        let update = to_update(ProfileUpdateRequest {
            date_of_birth: Some("  ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.date_of_birth, Some(None));
        let untouched = to_update(ProfileUpdateRequest::default()).unwrap();
        assert_eq!(untouched.date_of_birth, None);
    }

    #[test]
    fn bad_birth_dates_are_rejected() {
        let err = to_update(ProfileUpdateRequest {
            date_of_birth: Some("yesterday".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
