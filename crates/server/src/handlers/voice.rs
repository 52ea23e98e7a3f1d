use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use super::ensure_self;
use crate::app::voice::{self, VoiceOutcome};
use crate::app_state::AppState;
use crate::auth::auth_user;
use crate::errors::ServerError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{VoiceFallbackResponse, VoiceLog, VoiceRequest};
use crate::validate::required_text;

pub async fn list_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Vec<VoiceLog>>, ServerError> {
    let caller = auth_user(&state, &headers)?;
    ensure_self(&caller, user_id)?;
    let logs = state
        .repo
        .list_voice_logs(user_id)
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(logs))
}

/// 201 with the stored exchange, or 200 with `isError` when the fallback reply was used.
pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<VoiceRequest>,
) -> Result<Response, ServerError> {
    let caller = auth_user(&state, &headers)?;
    ensure_self(&caller, user_id)?;
    let message = required_text(payload.message, "message")?;

    let outcome = voice::ask(&state.voice, state.repo.as_ref(), user_id, &message).await?;
    let response = match outcome {
        VoiceOutcome::Answered(log) => (StatusCode::CREATED, Json(log)).into_response(),
        VoiceOutcome::Fallback(log) => (
            StatusCode::OK,
            Json(VoiceFallbackResponse {
                log,
                is_error: true,
            }),
        )
            .into_response(),
    };
    Ok(response)
}
